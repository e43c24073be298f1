//! End-to-end duel scenarios running the service layer against the in-memory
//! backend.

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use quiz_duel_back::{
    config::AppConfig,
    dao::{
        game_store::memory::InMemoryBackend,
        models::{GameStatus, PlayerOutcome, Question, UserProfile},
    },
    dto::game::{GamePairView, SubmitAnswerRequest},
    error::ServiceError,
    services::{game_view, matchmaking, play},
    state::{AppState, SharedState},
};

const CORRECT: &str = "42";
const WRONG: &str = "forty-three";

/// Build an application state with a seeded in-memory backend.
async fn harness(grace: Duration) -> (SharedState, Arc<InMemoryBackend>) {
    let state = AppState::new(AppConfig::with_values(5, grace));
    let backend = Arc::new(InMemoryBackend::new());
    for i in 0..12 {
        backend.seed_question(Question {
            id: Uuid::new_v4(),
            body: format!("question {i}"),
            correct_answers: vec![CORRECT.into()],
        });
    }
    state.set_backend(backend.clone()).await;
    (state, backend)
}

fn register(backend: &InMemoryBackend, login: &str) -> Uuid {
    let id = Uuid::new_v4();
    backend.seed_user(UserProfile {
        id,
        login: login.into(),
    });
    id
}

fn submission(text: &str) -> SubmitAnswerRequest {
    SubmitAnswerRequest {
        answer: text.into(),
    }
}

/// Connect two users and return the shared game view as the second one saw it.
async fn paired(state: &SharedState, first: Uuid, second: Uuid) -> GamePairView {
    matchmaking::connect(state, first).await.unwrap();
    matchmaking::connect(state, second).await.unwrap()
}

#[tokio::test]
async fn connect_creates_pending_game_then_pairs_the_next_caller() {
    let (state, backend) = harness(Duration::from_secs(60)).await;
    let alice = register(&backend, "alice");
    let bob = register(&backend, "bob");

    let pending = matchmaking::connect(&state, alice).await.unwrap();
    assert_eq!(pending.status, GameStatus::PendingSecondPlayer);
    assert!(pending.second_player_progress.is_none());
    assert!(pending.questions.is_none());
    assert!(pending.start_game_date.is_none());

    let active = matchmaking::connect(&state, bob).await.unwrap();
    assert_eq!(active.id, pending.id);
    assert_eq!(active.status, GameStatus::Active);
    assert_eq!(active.questions.as_ref().map(Vec::len), Some(5));
    assert!(active.start_game_date.is_some());
    let second = active.second_player_progress.expect("bob joined");
    assert_eq!(second.player.login, "bob");

    // Both players resolve the same game as their current one.
    let mine = game_view::current_pair(&state, alice).await.unwrap();
    assert_eq!(mine.id, active.id);
}

#[tokio::test]
async fn connect_rejects_users_already_in_an_unfinished_game() {
    let (state, backend) = harness(Duration::from_secs(60)).await;
    let alice = register(&backend, "alice");
    let bob = register(&backend, "bob");

    matchmaking::connect(&state, alice).await.unwrap();
    // Still pending: the creator cannot queue twice (nor pair with themselves).
    let err = matchmaking::connect(&state, alice).await.unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyInGame));

    matchmaking::connect(&state, bob).await.unwrap();
    // Active now, same answer.
    let err = matchmaking::connect(&state, bob).await.unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyInGame));
}

#[tokio::test]
async fn connect_rejects_unknown_users() {
    let (state, _backend) = harness(Duration::from_secs(60)).await;
    let err = matchmaking::connect(&state, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn connect_fails_when_the_question_bank_is_too_small() {
    let state = AppState::new(AppConfig::with_values(5, Duration::from_secs(60)));
    let backend = Arc::new(InMemoryBackend::new());
    backend.seed_question(Question {
        id: Uuid::new_v4(),
        body: "lonely".into(),
        correct_answers: vec![CORRECT.into()],
    });
    state.set_backend(backend.clone()).await;
    let alice = register(&backend, "alice");

    let err = matchmaking::connect(&state, alice).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotEnoughQuestions {
            available: 1,
            requested: 5
        }
    ));
}

#[tokio::test]
async fn first_finisher_takes_the_speed_bonus_and_both_finished_finalizes() {
    let (state, backend) = harness(Duration::from_secs(60)).await;
    let alice = register(&backend, "alice");
    let bob = register(&backend, "bob");
    let game = paired(&state, alice, bob).await;

    for _ in 0..5 {
        play::submit_answer(&state, alice, submission(CORRECT))
            .await
            .unwrap();
    }

    // Alice finished first: 5 correct plus the speed bonus.
    let view = game_view::pair_by_id(&state, game.id, alice).await.unwrap();
    assert_eq!(view.status, GameStatus::Active);
    assert_eq!(view.first_player_progress.score, 6);

    for i in 0..5 {
        let text = if i < 3 { CORRECT } else { WRONG };
        play::submit_answer(&state, bob, submission(text)).await.unwrap();
    }

    // Bob's last answer completed the pair, so the game finalized immediately.
    let view = game_view::pair_by_id(&state, game.id, bob).await.unwrap();
    assert_eq!(view.status, GameStatus::Finished);
    assert!(view.finish_game_date.is_some());
    assert_eq!(view.first_player_progress.score, 6);
    assert_eq!(view.first_player_progress.outcome, Some(PlayerOutcome::Win));
    let second = view.second_player_progress.expect("bob played");
    assert_eq!(second.score, 3);
    assert_eq!(second.outcome, Some(PlayerOutcome::Lose));
}

#[tokio::test]
async fn equal_scores_finish_as_a_draw() {
    let (state, backend) = harness(Duration::from_secs(60)).await;
    let alice = register(&backend, "alice");
    let bob = register(&backend, "bob");
    let game = paired(&state, alice, bob).await;

    // Alice: four correct, one wrong, plus the bonus -> 5.
    for i in 0..5 {
        let text = if i < 4 { CORRECT } else { WRONG };
        play::submit_answer(&state, alice, submission(text)).await.unwrap();
    }
    // Bob: five correct, no bonus -> 5.
    for _ in 0..5 {
        play::submit_answer(&state, bob, submission(CORRECT))
            .await
            .unwrap();
    }

    let view = game_view::pair_by_id(&state, game.id, alice).await.unwrap();
    assert_eq!(view.status, GameStatus::Finished);
    assert_eq!(view.first_player_progress.score, 5);
    assert_eq!(view.first_player_progress.outcome, Some(PlayerOutcome::Draw));
    let second = view.second_player_progress.expect("bob played");
    assert_eq!(second.score, 5);
    assert_eq!(second.outcome, Some(PlayerOutcome::Draw));
}

#[tokio::test]
async fn sixth_answer_is_rejected_once_the_sequence_is_exhausted() {
    let (state, backend) = harness(Duration::from_secs(60)).await;
    let alice = register(&backend, "alice");
    let bob = register(&backend, "bob");
    paired(&state, alice, bob).await;

    for _ in 0..5 {
        play::submit_answer(&state, alice, submission(CORRECT))
            .await
            .unwrap();
    }

    let err = play::submit_answer(&state, alice, submission(CORRECT))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AllQuestionsAnswered));
}

#[tokio::test]
async fn submitting_requires_an_active_game() {
    let (state, backend) = harness(Duration::from_secs(60)).await;
    let alice = register(&backend, "alice");
    let bob = register(&backend, "bob");

    // No game at all.
    let err = play::submit_answer(&state, alice, submission(CORRECT))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotInActiveGame));

    // Pending game: the sequence is not playable yet.
    matchmaking::connect(&state, alice).await.unwrap();
    let err = play::submit_answer(&state, alice, submission(CORRECT))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotInActiveGame));

    // An outsider with no slot in the active game.
    matchmaking::connect(&state, bob).await.unwrap();
    let carol = register(&backend, "carol");
    let err = play::submit_answer(&state, carol, submission(CORRECT))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotInActiveGame));
}

#[tokio::test]
async fn expired_grace_window_finalizes_on_read_and_rejects_late_answers() {
    // Zero grace: the opponent loses their window the moment the first
    // finisher completes the sequence.
    let (state, backend) = harness(Duration::ZERO).await;
    let alice = register(&backend, "alice");
    let bob = register(&backend, "bob");
    let game = paired(&state, alice, bob).await;

    play::submit_answer(&state, bob, submission(CORRECT))
        .await
        .unwrap();
    for _ in 0..5 {
        play::submit_answer(&state, alice, submission(CORRECT))
            .await
            .unwrap();
    }

    // Bob's next submission finds the game already frozen.
    let err = play::submit_answer(&state, bob, submission(CORRECT))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotInActiveGame));

    let view = game_view::pair_by_id(&state, game.id, bob).await.unwrap();
    assert_eq!(view.status, GameStatus::Finished);
    assert_eq!(view.first_player_progress.score, 6);
    assert_eq!(view.first_player_progress.outcome, Some(PlayerOutcome::Win));
    let second = view.second_player_progress.expect("bob played");
    assert_eq!(second.score, 1);
    assert_eq!(second.outcome, Some(PlayerOutcome::Lose));

    // The finished game is no longer anyone's current game.
    let err = game_view::current_pair(&state, bob).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn current_pair_read_materializes_an_overdue_finish() {
    let (state, backend) = harness(Duration::from_millis(50)).await;
    let alice = register(&backend, "alice");
    let bob = register(&backend, "bob");
    paired(&state, alice, bob).await;

    for _ in 0..5 {
        play::submit_answer(&state, alice, submission(CORRECT))
            .await
            .unwrap();
    }

    tokio::time::sleep(Duration::from_millis(150)).await;

    // The grace window elapsed with nobody writing; this read finalizes.
    let view = game_view::current_pair(&state, bob).await.unwrap();
    assert_eq!(view.status, GameStatus::Finished);
    assert_eq!(view.first_player_progress.outcome, Some(PlayerOutcome::Win));
}

#[tokio::test]
async fn pair_by_id_is_restricted_to_participants() {
    let (state, backend) = harness(Duration::from_secs(60)).await;
    let alice = register(&backend, "alice");
    let bob = register(&backend, "bob");
    let carol = register(&backend, "carol");
    let game = paired(&state, alice, bob).await;

    let err = game_view::pair_by_id(&state, game.id, carol).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let err = game_view::pair_by_id(&state, Uuid::new_v4(), alice)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn services_fail_closed_while_no_backend_is_installed() {
    let state = AppState::new(AppConfig::with_values(5, Duration::from_secs(60)));
    assert!(state.is_degraded().await);

    let err = matchmaking::connect(&state, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Degraded));
    let err = game_view::current_pair(&state, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Degraded));
}
