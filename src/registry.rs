//! The room → active-session table. At most one session per room: sessions
//! are inserted on create and remove themselves on entering Ended.

use crate::error::GameError;
use crate::host::{Identity, RoomSink};
use crate::leaderboard::{Ladder, LeaderboardEntry};
use crate::protocol::GameEvent;
use crate::session::SessionHandle;
use crate::store::TriviaStore;
use crate::text::to_id;
use crate::types::{category_label, Mode, RoomId, SessionConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct SessionRegistry {
    store: Arc<TriviaStore>,
    identity: Arc<dyn Identity>,
    sink: Arc<dyn RoomSink>,
    sessions: Mutex<HashMap<RoomId, Arc<SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<TriviaStore>,
        identity: Arc<dyn Identity>,
        sink: Arc<dyn RoomSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            identity,
            sink,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    /// Open signups for a new game in `room` with the default timing.
    pub async fn create(
        self: &Arc<Self>,
        room: &str,
        mode: Mode,
        category: &str,
        score_cap: i32,
    ) -> Result<Arc<SessionHandle>, GameError> {
        self.create_with_config(room, mode, category, score_cap, SessionConfig::default())
            .await
    }

    /// Open signups with explicit question/intermission periods.
    pub async fn create_with_config(
        self: &Arc<Self>,
        room: &str,
        mode: Mode,
        category: &str,
        score_cap: i32,
        config: SessionConfig,
    ) -> Result<Arc<SessionHandle>, GameError> {
        let category = to_id(category);
        if category_label(&category).is_none() {
            return Err(GameError::InvalidCategory(category));
        }

        let room: RoomId = room.to_string();
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&room) {
            return Err(GameError::AlreadyInProgress);
        }

        let session = SessionHandle::new(
            room.clone(),
            mode,
            category.clone(),
            score_cap,
            config,
            self.store.clone(),
            self.identity.clone(),
            self.sink.clone(),
            Arc::downgrade(self),
        );
        sessions.insert(room.clone(), session.clone());
        drop(sessions);

        tracing::info!(room = %room, mode = ?mode, category = %category, score_cap, "trivia signups opened");
        self.sink.deliver(
            &room,
            GameEvent::SignupsOpened {
                mode,
                category,
                score_cap,
            },
        );
        Ok(session)
    }

    /// The active session for a room.
    pub async fn session(&self, room: &str) -> Result<Arc<SessionHandle>, GameError> {
        self.sessions
            .lock()
            .await
            .get(room)
            .cloned()
            .ok_or(GameError::NoSession)
    }

    pub(crate) async fn remove(&self, room: &RoomId) {
        self.sessions.lock().await.remove(room);
    }

    /// Persistent standings for a userid or display name.
    pub async fn rank(&self, name_or_id: &str) -> Option<LeaderboardEntry> {
        self.store.rank_of(name_or_id).await
    }

    /// The public top-15 ladder.
    pub async fn ladder(&self) -> Ladder {
        self.store.ladder().await
    }

    pub fn store(&self) -> &Arc<TriviaStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testutil::{FakeIdentity, RecordingSink};

    async fn registry() -> (Arc<SessionRegistry>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = TriviaStore::open(dir.path().join("triviadata.json")).await;
        let registry = SessionRegistry::new(
            store,
            Arc::new(FakeIdentity::new()),
            Arc::new(RecordingSink::default()),
        );
        (registry, dir)
    }

    #[tokio::test]
    async fn test_one_session_per_room() {
        let (registry, _dir) = registry().await;

        registry
            .create("trivia", Mode::First, "science", 20)
            .await
            .unwrap();
        let err = registry
            .create("trivia", Mode::Timer, "history", 35)
            .await
            .unwrap_err();
        assert_eq!(err, GameError::AlreadyInProgress);

        // other rooms are independent
        registry
            .create("lounge", Mode::Timer, "history", 35)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_category() {
        let (registry, _dir) = registry().await;
        let err = registry
            .create("trivia", Mode::First, "cooking", 20)
            .await
            .unwrap_err();
        assert_eq!(err, GameError::InvalidCategory("cooking".to_string()));
    }

    #[tokio::test]
    async fn test_create_normalizes_category() {
        let (registry, _dir) = registry().await;
        let session = registry
            .create("trivia", Mode::First, "Anime/Manga", 20)
            .await
            .unwrap();
        let status = session.status(&"alice".to_string()).await.unwrap();
        assert_eq!(status.category, "animemanga");
    }

    #[tokio::test]
    async fn test_missing_session_lookup() {
        let (registry, _dir) = registry().await;
        assert!(matches!(
            registry.session("trivia").await,
            Err(GameError::NoSession)
        ));
    }
}
