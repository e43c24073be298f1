pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{Answer, Game, Player, PlayerOutcome, PlayerSlot, Question, UserProfile},
    storage::StorageResult,
};

/// Parameters of the atomic "claim the open slot" matchmaking write.
#[derive(Debug, Clone)]
pub struct SecondPlayerClaim {
    /// Fresh player record for the joining user.
    pub player: Player,
    /// Value for `start_game_date` when the claim succeeds.
    pub started_at: SystemTime,
}

/// Parameters of the atomic answer-recording write.
#[derive(Debug, Clone)]
pub struct AnswerRecord {
    /// Game the answer belongs to.
    pub game_id: Uuid,
    /// Slot of the submitting player.
    pub slot: PlayerSlot,
    /// The answer to append to the player's history.
    pub answer: Answer,
    /// Score increment, including the speed bonus when `finisher_mark` is set.
    pub score_delta: u32,
    /// When set, the write also claims the first-finisher mark; it only
    /// succeeds while `first_finisher_at` is still unset.
    pub finisher_mark: Option<SystemTime>,
}

/// Parameters of the atomic finalization write.
///
/// Carries the scores the outcomes were computed from; the write only applies
/// while the persisted scores still match, so a concurrently recorded answer
/// can never be counted in the scores but missed by the verdict.
#[derive(Debug, Clone)]
pub struct GameVerdict {
    /// Game to finalize.
    pub game_id: Uuid,
    /// Value for `finish_game_date`.
    pub finished_at: SystemTime,
    /// Outcome for the first player.
    pub first: PlayerOutcome,
    /// Outcome for the second player.
    pub second: PlayerOutcome,
    /// First player's score the outcomes were derived from.
    pub first_score: u32,
    /// Second player's score the outcomes were derived from.
    pub second_score: u32,
}

/// Abstraction over the persistence layer for duel games.
///
/// The claim, record, and finalize operations are conditional writes: they
/// apply only while their precondition still holds and return `None` when
/// another caller won the race. No multi-step workflow is ever observable
/// half-applied.
pub trait GameStore: Send + Sync {
    /// Persist a freshly created pending game.
    fn insert_game(&self, game: Game) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a game by id.
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<Game>>>;
    /// Fetch the user's game whose status is not `Finished`, if any.
    fn find_unfinished_for_user(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<Game>>>;
    /// Atomically claim the open pending slot: sets the second player, flips
    /// the status to `Active`, and stamps `start_game_date`. Returns the
    /// updated game, or `None` when no claimable pending game exists.
    fn claim_pending_slot(
        &self,
        claim: SecondPlayerClaim,
    ) -> BoxFuture<'static, StorageResult<Option<Game>>>;
    /// Atomically append an answer and bump the player's score while the game
    /// is still `Active`. Returns the updated game, or `None` when the game is
    /// no longer active, the player already answered this question, or the
    /// requested finisher mark was already taken.
    fn record_answer(
        &self,
        record: AnswerRecord,
    ) -> BoxFuture<'static, StorageResult<Option<Game>>>;
    /// Atomically finalize an `Active` game, assigning outcomes and the finish
    /// date. The write is conditional on the persisted scores still matching
    /// the ones inside the verdict. Returns the updated game, or `None` when
    /// the game was not active (already finalized by a concurrent caller, or
    /// still pending) or the scores moved since the verdict was computed.
    fn finalize_game(
        &self,
        verdict: GameVerdict,
    ) -> BoxFuture<'static, StorageResult<Option<Game>>>;
    /// Verify the backend connection is healthy.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a lost backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Pool of published questions games draw from.
pub trait QuestionBank: Send + Sync {
    /// Draw up to `count` distinct published questions at random. Callers
    /// treat a short draw as a fatal precondition failure.
    fn pick_random(&self, count: usize) -> BoxFuture<'static, StorageResult<Vec<Question>>>;
}

/// External user directory, consulted only to label player identity.
pub trait UserDirectory: Send + Sync {
    /// Resolve a user id to its profile, if the user exists.
    fn resolve(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserProfile>>>;
}

/// Full persistence surface the application runs against.
pub trait StorageBackend: GameStore + QuestionBank + UserDirectory {}

impl<T: GameStore + QuestionBank + UserDirectory> StorageBackend for T {}
