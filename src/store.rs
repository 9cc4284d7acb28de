//! The persisted trivia document and its store.
//!
//! One JSON document holds the leaderboard, ladder, question pool, and
//! pending submissions. Saves are asynchronous and coalesced: while a write
//! is in flight at most one follow-up write is remembered, never a queue.
//! In-memory state stays authoritative whether or not a write succeeds.

use crate::leaderboard::{self, Ladder, LeaderboardEntry};
use crate::text::to_id;
use crate::types::{Question, ScoreData, UserId};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Everything that survives a process restart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriviaData {
    #[serde(default)]
    pub leaderboard: HashMap<UserId, LeaderboardEntry>,
    #[serde(default)]
    pub ladder: Ladder,
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Question submissions awaiting review (the review workflow itself
    /// lives outside the engine)
    #[serde(default)]
    pub submissions: Vec<Question>,
    /// When this document was last written (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
}

#[derive(Default)]
struct WriteState {
    writing: bool,
    pending: bool,
}

pub struct TriviaStore {
    path: PathBuf,
    /// Temp file for atomic replace; rename onto `path` once written
    tmp_path: PathBuf,
    data: RwLock<TriviaData>,
    write_state: Mutex<WriteState>,
}

impl TriviaStore {
    /// Load the document at `path`, starting empty if it is missing or
    /// unreadable.
    pub async fn open(path: impl Into<PathBuf>) -> Arc<Self> {
        let path = path.into();
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(
                        "could not parse {}, starting with empty data: {}",
                        path.display(),
                        e
                    );
                    TriviaData::default()
                }
            },
            // Missing file on first run is normal
            Err(_) => TriviaData::default(),
        };

        let mut tmp = path.clone().into_os_string();
        tmp.push(".0");
        Arc::new(Self {
            path,
            tmp_path: PathBuf::from(tmp),
            data: RwLock::new(data),
            write_state: Mutex::new(WriteState::default()),
        })
    }

    /// Add a question to the shared pool and persist.
    pub async fn add_question(self: &Arc<Self>, question: Question) {
        self.data.write().await.questions.push(question);
        self.request_save().await;
    }

    /// Number of questions currently in the pool for a category.
    pub async fn question_count(&self, category: &str) -> usize {
        let data = self.data.read().await;
        if category == "random" {
            data.questions.len()
        } else {
            data.questions
                .iter()
                .filter(|q| q.category == category)
                .count()
        }
    }

    /// Build one session's question queue: the pool filtered by category
    /// ("random" takes everything), shuffled. Consumption is up to the
    /// session; the pool itself is untouched.
    pub async fn draw_questions(&self, category: &str) -> Vec<Question> {
        let data = self.data.read().await;
        let mut queue: Vec<Question> = if category == "random" {
            data.questions.clone()
        } else {
            data.questions
                .iter()
                .filter(|q| q.category == category)
                .cloned()
                .collect()
        };
        drop(data);

        queue.shuffle(&mut rand::rng());
        queue
    }

    /// Fold a finished session into the leaderboard and rebuild the ladder.
    pub async fn record_results(
        &self,
        participants: &HashMap<UserId, ScoreData>,
        winner: Option<&UserId>,
        prize: i32,
    ) {
        let mut data = self.data.write().await;
        let data = &mut *data;
        data.ladder = leaderboard::fold_session(&mut data.leaderboard, participants, winner, prize);
    }

    /// Leaderboard entry for a userid or display name.
    pub async fn rank_of(&self, name_or_id: &str) -> Option<LeaderboardEntry> {
        let id = to_id(name_or_id);
        self.data.read().await.leaderboard.get(&id).cloned()
    }

    /// The public top-15 ladder.
    pub async fn ladder(&self) -> Ladder {
        self.data.read().await.ladder.clone()
    }

    /// A copy of the whole document.
    pub async fn snapshot(&self) -> TriviaData {
        self.data.read().await.clone()
    }

    /// Request an asynchronous save. If a write is already in flight this
    /// marks a single trailing write instead of queueing.
    pub async fn request_save(self: &Arc<Self>) {
        {
            let mut state = self.write_state.lock().await;
            if state.writing {
                state.pending = true;
                return;
            }
            state.writing = true;
        }

        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                store.write_once().await;
                let again = {
                    let mut state = store.write_state.lock().await;
                    if state.pending {
                        state.pending = false;
                        true
                    } else {
                        state.writing = false;
                        false
                    }
                };
                if !again {
                    break;
                }
            }
        });
    }

    /// Write the document to disk immediately, bypassing the debounce.
    /// Intended for host shutdown and tests.
    pub async fn flush(&self) {
        self.write_once().await;
    }

    async fn write_once(&self) {
        let json = {
            let mut data = self.data.write().await;
            data.saved_at = Some(chrono::Utc::now().to_rfc3339());
            match serde_json::to_string_pretty(&*data) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("failed to serialize trivia data: {}", e);
                    return;
                }
            }
        };

        if let Err(e) = tokio::fs::write(&self.tmp_path, &json).await {
            tracing::error!("failed to write {}: {}", self.tmp_path.display(), e);
            return;
        }

        // rename is atomic on POSIX but can fail on other platforms; fall
        // back to rewriting the destination in place
        if let Err(e) = tokio::fs::rename(&self.tmp_path, &self.path).await {
            tracing::warn!(
                "atomic replace of {} failed ({}), writing directly",
                self.path.display(),
                e
            );
            if let Err(e) = tokio::fs::write(&self.path, &json).await {
                tracing::error!("failed to write {}: {}", self.path.display(), e);
            }
        }
    }
}
