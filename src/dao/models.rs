use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of a duel game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Created by a first player, waiting for an opponent to claim the slot.
    PendingSecondPlayer,
    /// Both players joined; answers are accepted.
    Active,
    /// Finalized; scores and outcomes are frozen.
    Finished,
}

/// Per-player verdict assigned when a game finalizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlayerOutcome {
    /// Higher final score than the opponent.
    Win,
    /// Lower final score than the opponent.
    Lose,
    /// Equal final scores.
    Draw,
}

/// Correctness of a single submitted answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    /// The submitted text matched one of the accepted answers.
    Correct,
    /// The submitted text matched none of the accepted answers.
    Incorrect,
}

/// Which of the two player slots of a game is being addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSlot {
    /// The player who created the game.
    First,
    /// The player who claimed the pending slot.
    Second,
}

/// Identity attributes resolved from the external user directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// Stable identifier of the user.
    pub id: Uuid,
    /// Login used to label the player in projections.
    pub login: String,
}

/// Published quiz question embedded into a game at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    /// Stable identifier for the question.
    pub id: Uuid,
    /// Question text shown to both players.
    pub body: String,
    /// Accepted answers, compared by case-sensitive exact match.
    pub correct_answers: Vec<String>,
}

/// Immutable record of one answer submitted by one player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    /// Question this answer was scored against.
    pub question_id: Uuid,
    /// Scoring verdict.
    pub status: AnswerStatus,
    /// Submission timestamp.
    pub added_at: SystemTime,
}

/// One participant's state inside one game.
///
/// A fresh player record is created per user per game; score and answers are
/// mutated only by the answer path, the outcome only at finalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    /// Primary key of the player record.
    pub id: Uuid,
    /// Owning user, immutable for the life of the record.
    pub user_id: Uuid,
    /// Login snapshot taken from the user directory at pairing time.
    pub login: String,
    /// Current score, including any speed bonus.
    pub score: u32,
    /// Answers ordered by submission time.
    pub answers: Vec<Answer>,
    /// Verdict, set only when the game finalizes.
    pub outcome: Option<PlayerOutcome>,
}

impl Player {
    /// Build a fresh zero-score player for `user`.
    pub fn new(user: UserProfile) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user.id,
            login: user.login,
            score: 0,
            answers: Vec::new(),
            outcome: None,
        }
    }

    /// Identifiers of the questions this player has already answered.
    pub fn answered_question_ids(&self) -> Vec<Uuid> {
        self.answers.iter().map(|answer| answer.question_id).collect()
    }
}

/// One match between two players over a fixed, shared question sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Game {
    /// Primary key of the game.
    pub id: Uuid,
    /// The player who created the game.
    pub first_player: Player,
    /// The opponent; `None` exactly while the game is pending.
    pub second_player: Option<Player>,
    /// Ordered question sequence, fixed at creation and shared by both players.
    pub questions: Vec<Question>,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Set when the second player claims the slot.
    pub start_game_date: Option<SystemTime>,
    /// Set when the game finalizes.
    pub finish_game_date: Option<SystemTime>,
    /// Set once, when either player first answers the whole sequence.
    pub first_finisher_at: Option<SystemTime>,
}

impl Game {
    /// Create a pending game owned by `first_player` over `questions`.
    pub fn new(first_player: Player, questions: Vec<Question>, created_at: SystemTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_player,
            second_player: None,
            questions,
            status: GameStatus::PendingSecondPlayer,
            created_at,
            start_game_date: None,
            finish_game_date: None,
            first_finisher_at: None,
        }
    }

    /// Borrow the player occupying `slot`, if present.
    pub fn player(&self, slot: PlayerSlot) -> Option<&Player> {
        match slot {
            PlayerSlot::First => Some(&self.first_player),
            PlayerSlot::Second => self.second_player.as_ref(),
        }
    }

    /// Mutably borrow the player occupying `slot`, if present.
    pub fn player_mut(&mut self, slot: PlayerSlot) -> Option<&mut Player> {
        match slot {
            PlayerSlot::First => Some(&mut self.first_player),
            PlayerSlot::Second => self.second_player.as_mut(),
        }
    }

    /// Slot occupied by `user_id`, if the user participates in this game.
    pub fn slot_of(&self, user_id: Uuid) -> Option<PlayerSlot> {
        if self.first_player.user_id == user_id {
            return Some(PlayerSlot::First);
        }
        match &self.second_player {
            Some(player) if player.user_id == user_id => Some(PlayerSlot::Second),
            _ => None,
        }
    }

    /// Next unanswered question for `slot`, following the fixed sequence order.
    pub fn next_question(&self, slot: PlayerSlot) -> Option<&Question> {
        let player = self.player(slot)?;
        let answered = player.answered_question_ids();
        self.questions
            .iter()
            .find(|question| !answered.contains(&question.id))
    }

    /// Whether the player in `slot` has answered the whole sequence.
    pub fn slot_finished(&self, slot: PlayerSlot) -> bool {
        self.player(slot)
            .is_some_and(|player| player.answers.len() >= self.questions.len())
    }

    /// Whether both players have answered the whole sequence.
    pub fn both_finished(&self) -> bool {
        self.slot_finished(PlayerSlot::First) && self.slot_finished(PlayerSlot::Second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(login: &str) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            login: login.into(),
        }
    }

    fn question(body: &str) -> Question {
        Question {
            id: Uuid::new_v4(),
            body: body.into(),
            correct_answers: vec!["yes".into()],
        }
    }

    fn answer(question_id: Uuid) -> Answer {
        Answer {
            question_id,
            status: AnswerStatus::Correct,
            added_at: SystemTime::now(),
        }
    }

    #[test]
    fn fresh_game_is_pending_without_second_player() {
        let game = Game::new(
            Player::new(user("alice")),
            vec![question("q1"), question("q2")],
            SystemTime::now(),
        );

        assert_eq!(game.status, GameStatus::PendingSecondPlayer);
        assert!(game.second_player.is_none());
        assert!(game.start_game_date.is_none());
        assert!(game.finish_game_date.is_none());
    }

    #[test]
    fn next_question_follows_sequence_and_skips_answered() {
        let questions = vec![question("q1"), question("q2"), question("q3")];
        let mut game = Game::new(
            Player::new(user("alice")),
            questions.clone(),
            SystemTime::now(),
        );

        assert_eq!(
            game.next_question(PlayerSlot::First).map(|q| q.id),
            Some(questions[0].id)
        );

        game.first_player.answers.push(answer(questions[0].id));
        assert_eq!(
            game.next_question(PlayerSlot::First).map(|q| q.id),
            Some(questions[1].id)
        );

        game.first_player.answers.push(answer(questions[1].id));
        game.first_player.answers.push(answer(questions[2].id));
        assert!(game.next_question(PlayerSlot::First).is_none());
        assert!(game.slot_finished(PlayerSlot::First));
    }

    #[test]
    fn slot_of_resolves_both_participants() {
        let alice = user("alice");
        let bob = user("bob");
        let outsider = user("carol");

        let mut game = Game::new(
            Player::new(alice.clone()),
            vec![question("q1")],
            SystemTime::now(),
        );
        game.second_player = Some(Player::new(bob.clone()));

        assert_eq!(game.slot_of(alice.id), Some(PlayerSlot::First));
        assert_eq!(game.slot_of(bob.id), Some(PlayerSlot::Second));
        assert_eq!(game.slot_of(outsider.id), None);
    }

    #[test]
    fn both_finished_requires_a_second_player() {
        let questions = vec![question("q1")];
        let mut game = Game::new(
            Player::new(user("alice")),
            questions.clone(),
            SystemTime::now(),
        );
        game.first_player.answers.push(answer(questions[0].id));

        assert!(game.slot_finished(PlayerSlot::First));
        assert!(!game.both_finished());
    }
}
