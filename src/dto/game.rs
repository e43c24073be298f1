use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{Answer, AnswerStatus, Game, GameStatus, Player, PlayerOutcome, Question},
    dto::format_system_time,
};

/// Payload carrying one answer for the caller's next unanswered question.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitAnswerRequest {
    /// Literal answer text, compared case-sensitively against the accepted set.
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
}

/// Scoring result returned right after an answer is recorded.
///
/// Game and score state are deliberately absent; callers re-query the pair
/// view for those.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnswerView {
    /// Question the answer was scored against.
    pub question_id: Uuid,
    /// Correct or incorrect.
    pub answer_status: AnswerStatus,
    /// Submission timestamp (RFC 3339).
    pub added_at: String,
}

/// Identity label of a participant.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerView {
    /// User identifier.
    pub id: Uuid,
    /// User login.
    pub login: String,
}

/// One participant's progress inside the pair view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerProgress {
    /// Who is playing.
    pub player: PlayerView,
    /// Current score, including any speed bonus.
    pub score: u32,
    /// Answers given so far, ordered by submission time.
    pub answers: Vec<AnswerView>,
    /// Win, lose, or draw; `null` until the game is finished.
    pub outcome: Option<PlayerOutcome>,
}

/// Question as exposed to players: the accepted answers never leave the engine.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionView {
    /// Question identifier.
    pub id: Uuid,
    /// Question text.
    pub body: String,
}

/// Externally visible projection of one duel game.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GamePairView {
    /// Game identifier.
    pub id: Uuid,
    /// Progress of the player who created the game.
    pub first_player_progress: PlayerProgress,
    /// Progress of the opponent; `null` until the slot is claimed.
    pub second_player_progress: Option<PlayerProgress>,
    /// The shared question sequence; `null` while the game is pending.
    pub questions: Option<Vec<QuestionView>>,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Creation timestamp (RFC 3339).
    pub pair_created_date: String,
    /// Pairing timestamp (RFC 3339), once the second player joined.
    pub start_game_date: Option<String>,
    /// Finalization timestamp (RFC 3339), once the game finished.
    pub finish_game_date: Option<String>,
}

impl From<Answer> for AnswerView {
    fn from(value: Answer) -> Self {
        Self {
            question_id: value.question_id,
            answer_status: value.status,
            added_at: format_system_time(value.added_at),
        }
    }
}

impl From<Player> for PlayerProgress {
    fn from(value: Player) -> Self {
        Self {
            player: PlayerView {
                id: value.user_id,
                login: value.login,
            },
            score: value.score,
            answers: value.answers.into_iter().map(Into::into).collect(),
            outcome: value.outcome,
        }
    }
}

impl From<Question> for QuestionView {
    fn from(value: Question) -> Self {
        Self {
            id: value.id,
            body: value.body,
        }
    }
}

impl From<Game> for GamePairView {
    fn from(game: Game) -> Self {
        // The question list stays hidden until the game actually starts.
        let questions = match game.status {
            GameStatus::PendingSecondPlayer => None,
            GameStatus::Active | GameStatus::Finished => {
                Some(game.questions.into_iter().map(Into::into).collect())
            }
        };

        Self {
            id: game.id,
            first_player_progress: game.first_player.into(),
            second_player_progress: game.second_player.map(Into::into),
            questions,
            status: game.status,
            pair_created_date: format_system_time(game.created_at),
            start_game_date: game.start_game_date.map(format_system_time),
            finish_game_date: game.finish_game_date.map(format_system_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::models::UserProfile;

    fn game() -> Game {
        Game::new(
            Player::new(UserProfile {
                id: Uuid::new_v4(),
                login: "alice".into(),
            }),
            vec![Question {
                id: Uuid::new_v4(),
                body: "q1".into(),
                correct_answers: vec!["secret".into()],
            }],
            SystemTime::now(),
        )
    }

    #[test]
    fn pending_view_hides_questions_and_opponent() {
        let view = GamePairView::from(game());
        assert!(view.questions.is_none());
        assert!(view.second_player_progress.is_none());
        assert!(view.start_game_date.is_none());
        assert_eq!(view.status, GameStatus::PendingSecondPlayer);
    }

    #[test]
    fn active_view_exposes_questions_without_accepted_answers() {
        let mut game = game();
        game.status = GameStatus::Active;
        game.start_game_date = Some(SystemTime::now());

        let view = GamePairView::from(game);
        let questions = view.questions.expect("questions visible once active");
        assert_eq!(questions.len(), 1);
        // QuestionView carries only id and body; serialize and double-check.
        let serialized = serde_json::to_string(&questions).unwrap();
        assert!(!serialized.contains("secret"));
    }
}
