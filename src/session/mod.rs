//! The per-room trivia session: signup handling, the phase state machine,
//! and deadline scheduling. Answer collection lives in `answer`, round
//! resolution and the paths into Ended in `resolve`.

mod answer;
mod resolve;

use crate::error::GameError;
use crate::host::{Identity, RoomSink};
use crate::protocol::GameEvent;
use crate::registry::SessionRegistry;
use crate::store::TriviaStore;
use crate::text::to_id;
use crate::types::{
    Mode, Phase, Question, RoomId, ScoreData, SessionConfig, SessionStatus, UserId,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tokio::time::Instant;

/// Fewest participants a game can run with
pub const MIN_PARTICIPANTS: usize = 3;

/// Consecutive rounds with zero respondents before the game ends itself
pub const INACTIVITY_LIMIT: u32 = 7;

/// Mutable state of one session. Always accessed through the handle's lock,
/// so operations and timer firings are serialized into discrete turns.
pub(crate) struct GameSession {
    pub(crate) mode: Mode,
    pub(crate) category: String,
    pub(crate) score_cap: i32,
    pub(crate) prize: i32,
    pub(crate) phase: Phase,
    pub(crate) participants: HashMap<UserId, ScoreData>,
    /// Shuffled once at start; popped from the back, never refilled
    pub(crate) question_queue: Vec<Question>,
    /// Canonical accepted answers for the live question
    pub(crate) current_answers: Vec<String>,
    /// Timer/Number: how many participants are currently credited correct
    pub(crate) correct_responders: i32,
    /// Timer mode: when the live question was asked
    pub(crate) asked_at: Option<Instant>,
    pub(crate) inactivity_counter: u32,
    /// At most one pending deadline at a time
    pub(crate) deadline: Option<AbortHandle>,
    /// Bumped on every schedule/cancel; a firing timer with a stale epoch
    /// lost the race to a cancellation and must do nothing
    pub(crate) timer_epoch: u64,
    pub(crate) config: SessionConfig,
}

impl GameSession {
    fn new(mode: Mode, category: String, score_cap: i32, config: SessionConfig) -> Self {
        Self {
            mode,
            category,
            score_cap,
            prize: crate::types::prize_for_cap(score_cap),
            phase: Phase::Signup,
            participants: HashMap::new(),
            question_queue: Vec::new(),
            current_answers: Vec::new(),
            correct_responders: 0,
            asked_at: None,
            inactivity_counter: 0,
            deadline: None,
            timer_epoch: 0,
            config,
        }
    }

    /// Ended is terminal; reaching an ended session means the dispatch layer
    /// kept a handle past removal.
    pub(crate) fn guard_live(&self) -> Result<(), GameError> {
        debug_assert!(self.phase != Phase::Ended, "operation on an ended session");
        if self.phase == Phase::Ended {
            return Err(GameError::SessionEnded);
        }
        Ok(())
    }

    pub(crate) fn cancel_deadline(&mut self) {
        if let Some(handle) = self.deadline.take() {
            handle.abort();
        }
        self.timer_epoch += 1;
    }
}

/// One active session, shared between the registry, the command layer, and
/// the session's own timer tasks.
pub struct SessionHandle {
    room: RoomId,
    pub(crate) state: Mutex<GameSession>,
    pub(crate) store: Arc<TriviaStore>,
    pub(crate) identity: Arc<dyn Identity>,
    pub(crate) sink: Arc<dyn RoomSink>,
    pub(crate) registry: Weak<SessionRegistry>,
}

// The capability fields are trait objects, so this can't be derived
impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("room", &self.room)
            .finish_non_exhaustive()
    }
}

impl SessionHandle {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        room: RoomId,
        mode: Mode,
        category: String,
        score_cap: i32,
        config: SessionConfig,
        store: Arc<TriviaStore>,
        identity: Arc<dyn Identity>,
        sink: Arc<dyn RoomSink>,
        registry: Weak<SessionRegistry>,
    ) -> Arc<Self> {
        Arc::new(Self {
            room,
            state: Mutex::new(GameSession::new(mode, category, score_cap, config)),
            store,
            identity,
            sink,
            registry,
        })
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Sign the user up for the game. Only valid during signups; one signup
    /// per user, and one per underlying network origin.
    pub async fn join(&self, user: &UserId) -> Result<(), GameError> {
        let mut state = self.state.lock().await;
        state.guard_live()?;
        if state.phase != Phase::Signup {
            return Err(GameError::NotSignupPhase);
        }
        if state.participants.contains_key(user) {
            return Err(GameError::AlreadySignedUp);
        }
        if state
            .participants
            .keys()
            .any(|other| self.identity.same_origin(user, other))
        {
            return Err(GameError::AlreadySignedUp);
        }

        state.participants.insert(user.clone(), ScoreData::new());
        Ok(())
    }

    /// Disqualify a participant. Refused while the game is at its minimum
    /// participant count.
    pub async fn kick(&self, target: &str) -> Result<UserId, GameError> {
        let mut state = self.state.lock().await;
        state.guard_live()?;
        if state.participants.len() < MIN_PARTICIPANTS {
            return Err(GameError::KickBelowMinimum);
        }

        let userid = to_id(target);
        if userid.is_empty() {
            return Err(GameError::UnknownUser(target.trim().to_string()));
        }
        if state.participants.remove(&userid).is_none() {
            return Err(GameError::NotAParticipant(target.trim().to_string()));
        }

        tracing::info!(room = %self.room, user = %userid, "participant disqualified");
        Ok(userid)
    }

    /// Close signups and ask the first question.
    pub async fn start(self: &Arc<Self>) -> Result<(), GameError> {
        let mut state = self.state.lock().await;
        state.guard_live()?;
        if state.phase != Phase::Signup {
            return Err(GameError::NotSignupPhase);
        }
        if state.participants.len() < MIN_PARTICIPANTS {
            return Err(GameError::NotEnoughParticipants);
        }

        state.question_queue = self.store.draw_questions(&state.category).await;
        tracing::info!(
            room = %self.room,
            mode = ?state.mode,
            questions = state.question_queue.len(),
            "trivia game started"
        );
        self.sink.deliver(&self.room, GameEvent::GameStarted);
        self.ask_question(&mut state).await;
        Ok(())
    }

    /// Force the game to end with no winner.
    pub async fn end(&self, user: &UserId) -> Result<(), GameError> {
        let mut state = self.state.lock().await;
        state.guard_live()?;
        state.cancel_deadline();
        self.sink
            .deliver(&self.room, GameEvent::ForcedEnd { by: user.clone() });
        self.finish(&mut state, None).await;
        Ok(())
    }

    /// Phase/mode/cap summary, plus the caller's own standing once signups
    /// have closed.
    pub async fn status(&self, user: &UserId) -> Result<SessionStatus, GameError> {
        let state = self.state.lock().await;
        state.guard_live()?;

        let mut status = SessionStatus {
            phase: state.phase,
            mode: state.mode,
            category: state.category.clone(),
            score_cap: state.score_cap,
            score: None,
            correct_answers: None,
        };
        if state.phase != Phase::Signup {
            if let Some(data) = state.participants.get(user) {
                status.score = Some(data.score);
                status.correct_answers = Some(data.correct_answers);
            }
        }
        Ok(status)
    }

    /// Display names of everyone signed up, falling back to the raw userid
    /// for users the host no longer knows.
    pub async fn participants(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.participants.keys().map(|id| self.name_of(id)).collect()
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase
    }

    pub(crate) fn name_of(&self, user: &UserId) -> String {
        self.identity
            .display_name(user)
            .unwrap_or_else(|| user.clone())
    }

    /// Cancel any live deadline and schedule a fresh one. The session holds
    /// at most one deadline; the epoch check in `on_deadline` discards a
    /// firing that lost the race to this cancellation.
    pub(crate) fn schedule(self: &Arc<Self>, state: &mut GameSession, delay: Duration) {
        state.cancel_deadline();
        let epoch = state.timer_epoch;
        let session = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(session) = session.upgrade() {
                session.on_deadline(epoch).await;
            }
        });
        state.deadline = Some(task.abort_handle());
    }

    async fn on_deadline(self: Arc<Self>, epoch: u64) {
        let mut state = self.state.lock().await;
        if state.timer_epoch != epoch || state.phase == Phase::Ended {
            return;
        }
        state.deadline = None;

        match state.phase {
            Phase::Asking => match state.mode {
                Mode::First => self.no_answer(&mut state).await,
                Mode::Timer => self.timer_answers(&mut state).await,
                Mode::Number => self.number_answers(&mut state).await,
            },
            Phase::Intermission => self.ask_question(&mut state).await,
            Phase::Signup | Phase::Ended => {}
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;
    use crate::registry::SessionRegistry;
    use crate::types::Question;

    async fn registry_with_questions(
        n: usize,
    ) -> (Arc<SessionRegistry>, Arc<RecordingSink>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = TriviaStore::open(dir.path().join("triviadata.json")).await;
        for i in 0..n {
            store
                .add_question(Question {
                    category: "science".to_string(),
                    question: format!("Question {i}?"),
                    answers: vec![format!("answer{i}")],
                })
                .await;
        }
        let sink = Arc::new(RecordingSink::default());
        let registry = SessionRegistry::new(store, Arc::new(FakeIdentity::new()), sink.clone());
        (registry, sink, dir)
    }

    #[tokio::test]
    async fn test_join_requires_signup_phase_and_unique_users() {
        let (registry, _sink, _dir) = registry_with_questions(5).await;
        let session = registry
            .create("trivia", Mode::First, "science", 20)
            .await
            .unwrap();

        session.join(&"alice".to_string()).await.unwrap();
        assert_eq!(
            session.join(&"alice".to_string()).await,
            Err(GameError::AlreadySignedUp)
        );

        session.join(&"bob".to_string()).await.unwrap();
        session.join(&"carol".to_string()).await.unwrap();
        session.start().await.unwrap();

        assert_eq!(
            session.join(&"dave".to_string()).await,
            Err(GameError::NotSignupPhase)
        );
    }

    #[tokio::test]
    async fn test_join_blocks_shared_network_origin() {
        let dir = tempfile::tempdir().unwrap();
        let store = TriviaStore::open(dir.path().join("triviadata.json")).await;
        let mut identity = FakeIdentity::new();
        identity
            .shared_origins
            .push(("alice".to_string(), "alice2".to_string()));
        let registry = SessionRegistry::new(
            store,
            Arc::new(identity),
            Arc::new(RecordingSink::default()),
        );
        let session = registry
            .create("trivia", Mode::First, "science", 20)
            .await
            .unwrap();

        session.join(&"alice".to_string()).await.unwrap();
        assert_eq!(
            session.join(&"alice2".to_string()).await,
            Err(GameError::AlreadySignedUp)
        );
    }

    #[tokio::test]
    async fn test_start_requires_three_participants() {
        let (registry, _sink, _dir) = registry_with_questions(5).await;
        let session = registry
            .create("trivia", Mode::First, "science", 20)
            .await
            .unwrap();

        session.join(&"alice".to_string()).await.unwrap();
        session.join(&"bob".to_string()).await.unwrap();
        assert_eq!(
            session.start().await,
            Err(GameError::NotEnoughParticipants)
        );
        assert_eq!(session.phase().await, Phase::Signup);

        session.join(&"carol".to_string()).await.unwrap();
        session.start().await.unwrap();
        assert_eq!(session.phase().await, Phase::Asking);
    }

    #[tokio::test]
    async fn test_kick_guards() {
        let (registry, _sink, _dir) = registry_with_questions(5).await;
        let session = registry
            .create("trivia", Mode::First, "science", 20)
            .await
            .unwrap();

        session.join(&"alice".to_string()).await.unwrap();
        session.join(&"bob".to_string()).await.unwrap();
        assert_eq!(
            session.kick("alice").await,
            Err(GameError::KickBelowMinimum)
        );

        session.join(&"carol".to_string()).await.unwrap();
        assert_eq!(
            session.kick("dave").await,
            Err(GameError::NotAParticipant("dave".to_string()))
        );
        assert_eq!(session.kick("!!!").await, Err(GameError::UnknownUser("!!!".to_string())));

        // kick normalizes the target to its canonical id
        assert_eq!(session.kick("Alice!").await, Ok("alice".to_string()));
        assert_eq!(session.participants().await.len(), 2);
    }

    #[tokio::test]
    async fn test_handle_debug_names_the_room() {
        let (registry, _sink, _dir) = registry_with_questions(0).await;
        let session = registry
            .create("trivia", Mode::First, "science", 20)
            .await
            .unwrap();

        assert!(format!("{session:?}").contains("trivia"));
    }

    #[tokio::test]
    async fn test_status_hides_scores_during_signup() {
        let (registry, _sink, _dir) = registry_with_questions(5).await;
        let session = registry
            .create("trivia", Mode::Timer, "science", 35)
            .await
            .unwrap();
        session.join(&"alice".to_string()).await.unwrap();

        let status = session.status(&"alice".to_string()).await.unwrap();
        assert_eq!(status.phase, Phase::Signup);
        assert_eq!(status.mode, Mode::Timer);
        assert_eq!(status.score_cap, 35);
        assert!(status.score.is_none());

        session.join(&"bob".to_string()).await.unwrap();
        session.join(&"carol".to_string()).await.unwrap();
        session.start().await.unwrap();

        let status = session.status(&"alice".to_string()).await.unwrap();
        assert_eq!(status.score, Some(0));
        assert_eq!(status.correct_answers, Some(0));

        // non-participants get the summary without a standing
        let status = session.status(&"dave".to_string()).await.unwrap();
        assert!(status.score.is_none());
    }
}
