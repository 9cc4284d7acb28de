//! Structured announcements the engine hands to the presentation layer.
//!
//! The engine never formats markup itself; a `RoomSink` receives these
//! events and renders them however the host chat surface requires.

use crate::types::{Mode, UserId};
use serde::{Deserialize, Serialize};

/// One group of a timer-mode round summary: everyone who earned the same
/// number of points this round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointsGroup {
    pub points: i32,
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum GameEvent {
    /// A new game is accepting signups
    SignupsOpened {
        mode: Mode,
        category: String,
        score_cap: i32,
    },
    /// Signups have closed and the first question is about to be asked
    GameStarted,
    /// A question is live and accepting answers
    Question { question: String, category: String },
    /// The answering period ended with nobody credited correct
    NoAnswer { answers: Vec<String> },
    /// First mode: somebody answered correctly and the round ended at once
    FirstCorrect {
        user: String,
        answers: Vec<String>,
        points: i32,
    },
    /// Timer mode round summary, groups ordered from 5 points down to 1
    TimerResults {
        answers: Vec<String>,
        groups: Vec<PointsGroup>,
    },
    /// Number mode round summary: every credited respondent gained `points`
    NumberResults {
        answers: Vec<String>,
        users: Vec<String>,
        points: i32,
    },
    /// Somebody reached the score cap and won the game
    GameWon {
        user: String,
        score: i32,
        prize: i32,
    },
    /// The question queue ran out with no winner
    Stalemate,
    /// Seven consecutive rounds passed with no answers at all
    InactivityEnd,
    /// A staff member forced the game to end
    ForcedEnd { by: UserId },
}
