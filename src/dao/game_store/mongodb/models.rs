use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    Answer, AnswerStatus, Game, GameStatus, Player, PlayerOutcome, PlayerSlot, Question,
    UserProfile,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAnswerDocument {
    pub question_id: Uuid,
    pub status: AnswerStatus,
    pub added_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerDocument {
    pub id: Uuid,
    pub user_id: Uuid,
    pub login: String,
    pub score: u32,
    pub answers: Vec<MongoAnswerDocument>,
    pub outcome: Option<PlayerOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub first_player: MongoPlayerDocument,
    pub second_player: Option<MongoPlayerDocument>,
    pub questions: Vec<Question>,
    pub status: GameStatus,
    pub created_at: DateTime,
    pub start_game_date: Option<DateTime>,
    pub finish_game_date: Option<DateTime>,
    pub first_finisher_at: Option<DateTime>,
}

/// Question-bank document; only `published: true` entries are drawn into games.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuestionDocument {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub body: String,
    pub correct_answers: Vec<String>,
    #[serde(default)]
    pub published: bool,
}

/// User-directory document maintained by the external account subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUserDocument {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub login: String,
}

/// Wire value of a [`GameStatus`] for use inside query filters.
pub fn status_str(status: GameStatus) -> &'static str {
    match status {
        GameStatus::PendingSecondPlayer => "pending_second_player",
        GameStatus::Active => "active",
        GameStatus::Finished => "finished",
    }
}

/// Document field prefix addressing the player in `slot`.
pub fn slot_path(slot: PlayerSlot) -> &'static str {
    match slot {
        PlayerSlot::First => "first_player",
        PlayerSlot::Second => "second_player",
    }
}

impl From<Answer> for MongoAnswerDocument {
    fn from(value: Answer) -> Self {
        Self {
            question_id: value.question_id,
            status: value.status,
            added_at: DateTime::from_system_time(value.added_at),
        }
    }
}

impl From<MongoAnswerDocument> for Answer {
    fn from(value: MongoAnswerDocument) -> Self {
        Self {
            question_id: value.question_id,
            status: value.status,
            added_at: value.added_at.to_system_time(),
        }
    }
}

impl From<Player> for MongoPlayerDocument {
    fn from(value: Player) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            login: value.login,
            score: value.score,
            answers: value.answers.into_iter().map(Into::into).collect(),
            outcome: value.outcome,
        }
    }
}

impl From<MongoPlayerDocument> for Player {
    fn from(value: MongoPlayerDocument) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            login: value.login,
            score: value.score,
            answers: value.answers.into_iter().map(Into::into).collect(),
            outcome: value.outcome,
        }
    }
}

impl From<Game> for MongoGameDocument {
    fn from(value: Game) -> Self {
        Self {
            id: value.id,
            first_player: value.first_player.into(),
            second_player: value.second_player.map(Into::into),
            questions: value.questions,
            status: value.status,
            created_at: DateTime::from_system_time(value.created_at),
            start_game_date: value.start_game_date.map(DateTime::from_system_time),
            finish_game_date: value.finish_game_date.map(DateTime::from_system_time),
            first_finisher_at: value.first_finisher_at.map(DateTime::from_system_time),
        }
    }
}

impl From<MongoGameDocument> for Game {
    fn from(value: MongoGameDocument) -> Self {
        Self {
            id: value.id,
            first_player: value.first_player.into(),
            second_player: value.second_player.map(Into::into),
            questions: value.questions,
            status: value.status,
            created_at: value.created_at.to_system_time(),
            start_game_date: value.start_game_date.map(|ts| ts.to_system_time()),
            finish_game_date: value.finish_game_date.map(|ts| ts.to_system_time()),
            first_finisher_at: value.first_finisher_at.map(|ts| ts.to_system_time()),
        }
    }
}

impl From<MongoQuestionDocument> for Question {
    fn from(value: MongoQuestionDocument) -> Self {
        Self {
            id: value.id,
            body: value.body,
            correct_answers: value.correct_answers,
        }
    }
}

impl From<MongoUserDocument> for UserProfile {
    fn from(value: MongoUserDocument) -> Self {
        Self {
            id: value.id,
            login: value.login,
        }
    }
}
