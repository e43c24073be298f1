use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save game `{id}`")]
    SaveGame {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load game `{id}`")]
    LoadGame {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to look up games for user `{user_id}`")]
    FindForUser {
        user_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to claim the pending slot for user `{user_id}`")]
    ClaimSlot {
        user_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to record an answer on game `{id}`")]
    RecordAnswer {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to finalize game `{id}`")]
    FinalizeGame {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to sample published questions")]
    PickQuestions {
        #[source]
        source: MongoError,
    },
    #[error("failed to resolve user `{user_id}`")]
    ResolveUser {
        user_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to encode a document for MongoDB")]
    Encode {
        #[source]
        source: mongodb::bson::ser::Error,
    },
    #[error("failed to decode a document returned by MongoDB")]
    Decode {
        #[source]
        source: mongodb::bson::de::Error,
    },
}
