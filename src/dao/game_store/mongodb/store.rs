use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{Document, doc, from_document, to_bson},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoGameDocument, MongoPlayerDocument, MongoQuestionDocument, MongoUserDocument,
        slot_path, status_str,
    },
};
use crate::dao::{
    game_store::{
        AnswerRecord, GameStore, GameVerdict, QuestionBank, SecondPlayerClaim, UserDirectory,
    },
    models::{Game, GameStatus, Question, UserProfile},
    storage::StorageResult,
};

const GAME_COLLECTION_NAME: &str = "games";
const QUESTION_COLLECTION_NAME: &str = "questions";
const USER_COLLECTION_NAME: &str = "users";

/// MongoDB-backed storage for duel games, the question bank, and the user
/// directory. Conditional writes are expressed as `find_one_and_update`
/// operations so each race has exactly one winner.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        // Matchmaking claims and current-pair lookups both filter on status.
        let games = database.collection::<Document>(GAME_COLLECTION_NAME);
        for (keys, name) in [
            (doc! {"status": 1}, "game_status_idx"),
            (doc! {"first_player.user_id": 1}, "game_first_user_idx"),
            (doc! {"second_player.user_id": 1}, "game_second_user_idx"),
        ] {
            let index = mongodb::IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().name(Some(name.to_owned())).build())
                .build();
            games
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: GAME_COLLECTION_NAME,
                    index: "status/user",
                    source,
                })?;
        }

        let questions = database.collection::<Document>(QUESTION_COLLECTION_NAME);
        let published_index = mongodb::IndexModel::builder()
            .keys(doc! {"published": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("question_published_idx".to_owned()))
                    .build(),
            )
            .build();
        questions
            .create_index(published_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: QUESTION_COLLECTION_NAME,
                index: "published",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn games(&self) -> Collection<MongoGameDocument> {
        self.database()
            .await
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn users(&self) -> Collection<MongoUserDocument> {
        self.database()
            .await
            .collection::<MongoUserDocument>(USER_COLLECTION_NAME)
    }

    async fn insert_game(&self, game: Game) -> MongoResult<()> {
        let id = game.id;
        let document: MongoGameDocument = game.into();
        self.games()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveGame { id, source })?;
        Ok(())
    }

    async fn find_game(&self, id: Uuid) -> MongoResult<Option<Game>> {
        let document = self
            .games()
            .await
            .find_one(doc! {"_id": id.to_string()})
            .await
            .map_err(|source| MongoDaoError::LoadGame { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn find_unfinished_for_user(&self, user_id: Uuid) -> MongoResult<Option<Game>> {
        let filter = doc! {
            "status": {"$ne": status_str(GameStatus::Finished)},
            "$or": [
                {"first_player.user_id": user_id.to_string()},
                {"second_player.user_id": user_id.to_string()},
            ],
        };

        let document = self
            .games()
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::FindForUser { user_id, source })?;
        Ok(document.map(Into::into))
    }

    async fn claim_pending_slot(&self, claim: SecondPlayerClaim) -> MongoResult<Option<Game>> {
        let user_id = claim.player.user_id;
        let player_doc: MongoPlayerDocument = claim.player.into();
        let player_bson =
            to_bson(&player_doc).map_err(|source| MongoDaoError::Encode { source })?;

        // Conditional update: only one concurrent connect can flip the slot.
        let filter = doc! {
            "status": status_str(GameStatus::PendingSecondPlayer),
            "second_player": null,
            "first_player.user_id": {"$ne": user_id.to_string()},
        };
        let update = doc! {
            "$set": {
                "second_player": player_bson,
                "status": status_str(GameStatus::Active),
                "start_game_date": mongodb::bson::DateTime::from_system_time(claim.started_at),
            },
        };

        let document = self
            .games()
            .await
            .find_one_and_update(filter, update)
            .sort(doc! {"created_at": 1})
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::ClaimSlot { user_id, source })?;
        Ok(document.map(Into::into))
    }

    async fn record_answer(&self, record: AnswerRecord) -> MongoResult<Option<Game>> {
        let id = record.game_id;
        let prefix = slot_path(record.slot);
        let question_id = record.answer.question_id;
        let answer_bson = to_bson(&super::models::MongoAnswerDocument::from(record.answer))
            .map_err(|source| MongoDaoError::Encode { source })?;

        let mut filter = doc! {
            "_id": id.to_string(),
            "status": status_str(GameStatus::Active),
            // A question can be answered at most once per player.
            format!("{prefix}.answers.question_id"): {"$ne": question_id.to_string()},
        };
        let mut update = doc! {
            "$push": {format!("{prefix}.answers"): answer_bson},
            "$inc": {format!("{prefix}.score"): record.score_delta as i64},
        };
        if let Some(mark) = record.finisher_mark {
            // The finisher mark is first-write-wins; losing the race fails the
            // whole update so the caller can retry without the bonus.
            filter.insert("first_finisher_at", mongodb::bson::Bson::Null);
            update.insert(
                "$set",
                doc! {"first_finisher_at": mongodb::bson::DateTime::from_system_time(mark)},
            );
        }

        let document = self
            .games()
            .await
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::RecordAnswer { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn finalize_game(&self, verdict: GameVerdict) -> MongoResult<Option<Game>> {
        let id = verdict.game_id;
        let first =
            to_bson(&verdict.first).map_err(|source| MongoDaoError::Encode { source })?;
        let second =
            to_bson(&verdict.second).map_err(|source| MongoDaoError::Encode { source })?;

        let filter = doc! {
            "_id": id.to_string(),
            "status": status_str(GameStatus::Active),
            // Outcomes must agree with the persisted scores; an answer landing
            // after the verdict snapshot fails the write so the caller re-reads.
            "first_player.score": verdict.first_score as i64,
            "second_player.score": verdict.second_score as i64,
        };
        let update = doc! {
            "$set": {
                "status": status_str(GameStatus::Finished),
                "finish_game_date": mongodb::bson::DateTime::from_system_time(verdict.finished_at),
                "first_player.outcome": first,
                "second_player.outcome": second,
            },
        };

        let document = self
            .games()
            .await
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::FinalizeGame { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn pick_random(&self, count: usize) -> MongoResult<Vec<Question>> {
        let pipeline = vec![
            doc! {"$match": {"published": true}},
            doc! {"$sample": {"size": count as i64}},
        ];

        let documents: Vec<Document> = self
            .database()
            .await
            .collection::<Document>(QUESTION_COLLECTION_NAME)
            .aggregate(pipeline)
            .await
            .map_err(|source| MongoDaoError::PickQuestions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::PickQuestions { source })?;

        documents
            .into_iter()
            .map(|document| {
                from_document::<MongoQuestionDocument>(document)
                    .map(Into::into)
                    .map_err(|source| MongoDaoError::Decode { source })
            })
            .collect()
    }

    async fn resolve_user(&self, user_id: Uuid) -> MongoResult<Option<UserProfile>> {
        let document = self
            .users()
            .await
            .find_one(doc! {"_id": user_id.to_string()})
            .await
            .map_err(|source| MongoDaoError::ResolveUser { user_id, source })?;
        Ok(document.map(Into::into))
    }
}

impl GameStore for MongoGameStore {
    fn insert_game(&self, game: Game) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_game(game).await.map_err(Into::into) })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<Game>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(id).await.map_err(Into::into) })
    }

    fn find_unfinished_for_user(
        &self,
        user_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<Game>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_unfinished_for_user(user_id)
                .await
                .map_err(Into::into)
        })
    }

    fn claim_pending_slot(
        &self,
        claim: SecondPlayerClaim,
    ) -> BoxFuture<'static, StorageResult<Option<Game>>> {
        let store = self.clone();
        Box::pin(async move { store.claim_pending_slot(claim).await.map_err(Into::into) })
    }

    fn record_answer(
        &self,
        record: AnswerRecord,
    ) -> BoxFuture<'static, StorageResult<Option<Game>>> {
        let store = self.clone();
        Box::pin(async move { store.record_answer(record).await.map_err(Into::into) })
    }

    fn finalize_game(
        &self,
        verdict: GameVerdict,
    ) -> BoxFuture<'static, StorageResult<Option<Game>>> {
        let store = self.clone();
        Box::pin(async move { store.finalize_game(verdict).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

impl QuestionBank for MongoGameStore {
    fn pick_random(&self, count: usize) -> BoxFuture<'static, StorageResult<Vec<Question>>> {
        let store = self.clone();
        Box::pin(async move { store.pick_random(count).await.map_err(Into::into) })
    }
}

impl UserDirectory for MongoGameStore {
    fn resolve(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserProfile>>> {
        let store = self.clone();
        Box::pin(async move { store.resolve_user(user_id).await.map_err(Into::into) })
    }
}
