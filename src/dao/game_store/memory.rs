//! In-memory storage backend.
//!
//! Backs the test suite and mirrors the conditional-write contract of the
//! database backends: the pending-slot claim, answer recording, and
//! finalization are each applied under a single lock so exactly one racing
//! caller can win.

use std::sync::Mutex;

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use rand::seq::IteratorRandom;
use uuid::Uuid;

use crate::dao::{
    game_store::{AnswerRecord, GameStore, GameVerdict, QuestionBank, SecondPlayerClaim, UserDirectory},
    models::{Game, GameStatus, Question, UserProfile},
    storage::StorageResult,
};

/// Storage backend keeping every record in process memory.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    // IndexMap keeps insertion order so the oldest pending game is claimed first.
    games: Mutex<IndexMap<Uuid, Game>>,
    questions: DashMap<Uuid, Question>,
    users: DashMap<Uuid, UserProfile>,
}

impl InMemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a published question in the bank.
    pub fn seed_question(&self, question: Question) {
        self.questions.insert(question.id, question);
    }

    /// Register a user in the directory.
    pub fn seed_user(&self, user: UserProfile) {
        self.users.insert(user.id, user);
    }

    fn games(&self) -> std::sync::MutexGuard<'_, IndexMap<Uuid, Game>> {
        self.games.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl GameStore for InMemoryBackend {
    fn insert_game(&self, game: Game) -> BoxFuture<'static, StorageResult<()>> {
        self.games().insert(game.id, game);
        Box::pin(async { Ok(()) })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<Game>>> {
        let found = self.games().get(&id).cloned();
        Box::pin(async move { Ok(found) })
    }

    fn find_unfinished_for_user(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<Game>>> {
        let found = self
            .games()
            .values()
            .find(|game| game.status != GameStatus::Finished && game.slot_of(user_id).is_some())
            .cloned();
        Box::pin(async move { Ok(found) })
    }

    fn claim_pending_slot(
        &self,
        claim: SecondPlayerClaim,
    ) -> BoxFuture<'static, StorageResult<Option<Game>>> {
        let claimed = {
            let mut games = self.games();
            let open_slot = games.values_mut().find(|game| {
                game.status == GameStatus::PendingSecondPlayer
                    && game.second_player.is_none()
                    && game.first_player.user_id != claim.player.user_id
            });

            open_slot.map(|game| {
                game.second_player = Some(claim.player);
                game.status = GameStatus::Active;
                game.start_game_date = Some(claim.started_at);
                game.clone()
            })
        };
        Box::pin(async move { Ok(claimed) })
    }

    fn record_answer(
        &self,
        record: AnswerRecord,
    ) -> BoxFuture<'static, StorageResult<Option<Game>>> {
        let updated = {
            let mut games = self.games();
            let eligible = games.get_mut(&record.game_id).filter(|game| {
                game.status == GameStatus::Active
                    && (record.finisher_mark.is_none() || game.first_finisher_at.is_none())
            });

            eligible.and_then(|game| {
                // Resolve the player first so nothing is mutated on a bad slot.
                let player = game.player_mut(record.slot)?;
                if player
                    .answers
                    .iter()
                    .any(|a| a.question_id == record.answer.question_id)
                {
                    return None;
                }
                player.answers.push(record.answer);
                player.score += record.score_delta;
                if let Some(mark) = record.finisher_mark {
                    game.first_finisher_at = Some(mark);
                }
                Some(game.clone())
            })
        };
        Box::pin(async move { Ok(updated) })
    }

    fn finalize_game(
        &self,
        verdict: GameVerdict,
    ) -> BoxFuture<'static, StorageResult<Option<Game>>> {
        let finalized = {
            let mut games = self.games();
            let active = games.get_mut(&verdict.game_id).filter(|game| {
                game.status == GameStatus::Active
                    && game.first_player.score == verdict.first_score
                    && game
                        .second_player
                        .as_ref()
                        .map(|player| player.score)
                        .unwrap_or_default()
                        == verdict.second_score
            });

            active.map(|game| {
                game.status = GameStatus::Finished;
                game.finish_game_date = Some(verdict.finished_at);
                game.first_player.outcome = Some(verdict.first);
                if let Some(second) = game.second_player.as_mut() {
                    second.outcome = Some(verdict.second);
                }
                game.clone()
            })
        };
        Box::pin(async move { Ok(finalized) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

impl QuestionBank for InMemoryBackend {
    fn pick_random(&self, count: usize) -> BoxFuture<'static, StorageResult<Vec<Question>>> {
        let mut rng = rand::rng();
        let drawn = self
            .questions
            .iter()
            .map(|entry| entry.value().clone())
            .choose_multiple(&mut rng, count);
        Box::pin(async move { Ok(drawn) })
    }
}

impl UserDirectory for InMemoryBackend {
    fn resolve(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserProfile>>> {
        let profile = self.users.get(&user_id).map(|entry| entry.value().clone());
        Box::pin(async move { Ok(profile) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::models::{Answer, AnswerStatus, Player, PlayerOutcome, PlayerSlot};

    fn profile(login: &str) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            login: login.into(),
        }
    }

    fn question(body: &str) -> Question {
        Question {
            id: Uuid::new_v4(),
            body: body.into(),
            correct_answers: vec!["42".into()],
        }
    }

    fn pending_game(backend: &InMemoryBackend, owner: &UserProfile) -> Game {
        let game = Game::new(
            Player::new(owner.clone()),
            vec![question("q1"), question("q2")],
            SystemTime::now(),
        );
        futures::executor::block_on(backend.insert_game(game.clone())).unwrap();
        game
    }

    #[test]
    fn claim_takes_the_oldest_pending_slot_exactly_once() {
        let backend = InMemoryBackend::new();
        let alice = profile("alice");
        let game = pending_game(&backend, &alice);

        let bob = profile("bob");
        let claimed = futures::executor::block_on(backend.claim_pending_slot(SecondPlayerClaim {
            player: Player::new(bob.clone()),
            started_at: SystemTime::now(),
        }))
        .unwrap()
        .expect("open slot should be claimable");

        assert_eq!(claimed.id, game.id);
        assert_eq!(claimed.status, GameStatus::Active);
        assert!(claimed.start_game_date.is_some());
        assert_eq!(claimed.slot_of(bob.id), Some(PlayerSlot::Second));

        // The slot is gone; the next claim falls through to game creation.
        let carol = profile("carol");
        let second_claim =
            futures::executor::block_on(backend.claim_pending_slot(SecondPlayerClaim {
                player: Player::new(carol),
                started_at: SystemTime::now(),
            }))
            .unwrap();
        assert!(second_claim.is_none());
    }

    #[test]
    fn claim_never_pairs_a_user_with_themselves() {
        let backend = InMemoryBackend::new();
        let alice = profile("alice");
        pending_game(&backend, &alice);

        let claimed = futures::executor::block_on(backend.claim_pending_slot(SecondPlayerClaim {
            player: Player::new(alice),
            started_at: SystemTime::now(),
        }))
        .unwrap();
        assert!(claimed.is_none());
    }

    #[test]
    fn finisher_mark_is_claimed_at_most_once() {
        let backend = InMemoryBackend::new();
        let alice = profile("alice");
        let bob = profile("bob");
        let game = pending_game(&backend, &alice);
        futures::executor::block_on(backend.claim_pending_slot(SecondPlayerClaim {
            player: Player::new(bob),
            started_at: SystemTime::now(),
        }))
        .unwrap();

        let answer = Answer {
            question_id: game.questions[0].id,
            status: AnswerStatus::Correct,
            added_at: SystemTime::now(),
        };

        let marked = futures::executor::block_on(backend.record_answer(AnswerRecord {
            game_id: game.id,
            slot: PlayerSlot::First,
            answer: answer.clone(),
            score_delta: 2,
            finisher_mark: Some(SystemTime::now()),
        }))
        .unwrap();
        assert!(marked.is_some_and(|game| game.first_finisher_at.is_some()));

        // Second attempt to take the mark loses the race.
        let lost = futures::executor::block_on(backend.record_answer(AnswerRecord {
            game_id: game.id,
            slot: PlayerSlot::Second,
            answer,
            score_delta: 2,
            finisher_mark: Some(SystemTime::now()),
        }))
        .unwrap();
        assert!(lost.is_none());
    }

    #[test]
    fn finalize_applies_only_to_active_games() {
        let backend = InMemoryBackend::new();
        let alice = profile("alice");
        let bob = profile("bob");
        let game = pending_game(&backend, &alice);

        let verdict = GameVerdict {
            game_id: game.id,
            finished_at: SystemTime::now(),
            first: PlayerOutcome::Draw,
            second: PlayerOutcome::Draw,
            first_score: 0,
            second_score: 0,
        };

        // Still pending: nothing to finalize.
        let early = futures::executor::block_on(backend.finalize_game(verdict.clone())).unwrap();
        assert!(early.is_none());

        futures::executor::block_on(backend.claim_pending_slot(SecondPlayerClaim {
            player: Player::new(bob),
            started_at: SystemTime::now(),
        }))
        .unwrap();

        let finalized = futures::executor::block_on(backend.finalize_game(verdict.clone()))
            .unwrap()
            .expect("active game should finalize");
        assert_eq!(finalized.status, GameStatus::Finished);
        assert_eq!(finalized.first_player.outcome, Some(PlayerOutcome::Draw));

        // Idempotent at the store level: a second verdict finds nothing active.
        let again = futures::executor::block_on(backend.finalize_game(verdict)).unwrap();
        assert!(again.is_none());
    }

    #[test]
    fn record_answer_rejects_a_duplicate_question_for_the_same_player() {
        let backend = InMemoryBackend::new();
        let alice = profile("alice");
        let bob = profile("bob");
        let game = pending_game(&backend, &alice);
        futures::executor::block_on(backend.claim_pending_slot(SecondPlayerClaim {
            player: Player::new(bob),
            started_at: SystemTime::now(),
        }))
        .unwrap();

        let answer = Answer {
            question_id: game.questions[0].id,
            status: AnswerStatus::Correct,
            added_at: SystemTime::now(),
        };
        let record = AnswerRecord {
            game_id: game.id,
            slot: PlayerSlot::First,
            answer,
            score_delta: 1,
            finisher_mark: None,
        };

        let first = futures::executor::block_on(backend.record_answer(record.clone()))
            .unwrap()
            .expect("first submission lands");
        assert_eq!(first.first_player.score, 1);
        assert_eq!(first.first_player.answers.len(), 1);

        // Same player, same question: the write must not apply twice.
        let duplicate = futures::executor::block_on(backend.record_answer(record)).unwrap();
        assert!(duplicate.is_none());

        let unchanged = futures::executor::block_on(backend.find_game(game.id))
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.first_player.score, 1);
        assert_eq!(unchanged.first_player.answers.len(), 1);
    }

    #[test]
    fn finalize_rejects_verdicts_computed_from_stale_scores() {
        let backend = InMemoryBackend::new();
        let alice = profile("alice");
        let bob = profile("bob");
        let game = pending_game(&backend, &alice);
        futures::executor::block_on(backend.claim_pending_slot(SecondPlayerClaim {
            player: Player::new(bob),
            started_at: SystemTime::now(),
        }))
        .unwrap();

        // Verdict computed from a 0:0 snapshot.
        let stale = GameVerdict {
            game_id: game.id,
            finished_at: SystemTime::now(),
            first: PlayerOutcome::Draw,
            second: PlayerOutcome::Draw,
            first_score: 0,
            second_score: 0,
        };

        // An answer lands after the snapshot was taken.
        futures::executor::block_on(backend.record_answer(AnswerRecord {
            game_id: game.id,
            slot: PlayerSlot::Second,
            answer: Answer {
                question_id: game.questions[0].id,
                status: AnswerStatus::Correct,
                added_at: SystemTime::now(),
            },
            score_delta: 1,
            finisher_mark: None,
        }))
        .unwrap()
        .expect("answer lands");

        // The stale verdict no longer matches the persisted scores.
        let rejected = futures::executor::block_on(backend.finalize_game(stale)).unwrap();
        assert!(rejected.is_none());
        let current = futures::executor::block_on(backend.find_game(game.id))
            .unwrap()
            .unwrap();
        assert_eq!(current.status, GameStatus::Active);

        // A verdict derived from the current scores applies cleanly.
        let fresh = GameVerdict {
            game_id: game.id,
            finished_at: SystemTime::now(),
            first: PlayerOutcome::Lose,
            second: PlayerOutcome::Win,
            first_score: 0,
            second_score: 1,
        };
        let finalized = futures::executor::block_on(backend.finalize_game(fresh))
            .unwrap()
            .expect("fresh verdict finalizes");
        assert_eq!(finalized.status, GameStatus::Finished);
        assert_eq!(finalized.first_player.outcome, Some(PlayerOutcome::Lose));
        assert_eq!(
            finalized.second_player.and_then(|player| player.outcome),
            Some(PlayerOutcome::Win)
        );
    }

    #[test]
    fn pick_random_draws_distinct_questions() {
        let backend = InMemoryBackend::new();
        for i in 0..10 {
            backend.seed_question(question(&format!("q{i}")));
        }

        let drawn = futures::executor::block_on(backend.pick_random(5)).unwrap();
        assert_eq!(drawn.len(), 5);
        let mut ids: Vec<Uuid> = drawn.iter().map(|q| q.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }
}
