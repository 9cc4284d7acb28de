use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque ID types for type safety
pub type UserId = String;
pub type RoomId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    First,
    Timer,
    Number,
}

impl Mode {
    /// Human-readable mode name, for hosts rendering announcements
    pub fn label(&self) -> &'static str {
        match self {
            Mode::First => "First",
            Mode::Timer => "Timer",
            Mode::Number => "Number",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Signup,
    Asking,
    Intermission,
    Ended,
}

/// Valid question categories, keyed by canonical id. "random" is a
/// pseudo-category that draws from the whole pool.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("animemanga", "Anime/Manga"),
    ("geography", "Geography"),
    ("history", "History"),
    ("humanities", "Humanities"),
    ("miscellaneous", "Miscellaneous"),
    ("music", "Music"),
    ("pokemon", "Pokemon"),
    ("rpm", "Religion, Philosophy, and Myth"),
    ("science", "Science"),
    ("sports", "Sports"),
    ("tvmovies", "TV/Movies"),
    ("videogames", "Video Games"),
    ("random", "Random"),
];

/// Look up the display label for a category id
pub fn category_label(id: &str) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, label)| *label)
}

/// The three canonical game lengths and their score caps
pub const SCORE_CAPS: &[(&str, i32)] = &[("short", 20), ("medium", 35), ("long", 50)];

/// Resolve a game-length word from the host command layer ("short",
/// "medium", "long") to the score cap it passes to create
pub fn score_cap(id: &str) -> Option<i32> {
    SCORE_CAPS.iter().find(|(key, _)| *key == id).map(|(_, cap)| *cap)
}

/// Leaderboard prize for winning a game with the given score cap
pub fn prize_for_cap(score_cap: i32) -> i32 {
    (score_cap - 5) / 15 + 2
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long participants have to answer each question
    pub question_period: Duration,
    /// Pause between a round resolving and the next question
    pub intermission_period: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            question_period: Duration::from_secs(15),
            intermission_period: Duration::from_secs(30),
        }
    }
}

/// A question in the shared pool. Immutable once drawn into a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub category: String,
    pub question: String,
    /// Canonical accepted-answer ids (see `text::to_id`)
    pub answers: Vec<String>,
}

/// Per-participant state for one session
#[derive(Debug, Clone)]
pub struct ScoreData {
    pub score: i32,
    pub correct_answers: i32,
    /// Whether this participant submitted anything this round
    pub answered: bool,
    /// Order in which this participant became credited correct this round;
    /// -1 while not credited. Used only as a win tie-break.
    pub responder_index: i32,
    /// Timer mode: the provisional points currently credited this round,
    /// subtracted again if the participant flips to an incorrect answer.
    pub pending_points: i32,
}

impl ScoreData {
    pub fn new() -> Self {
        Self {
            score: 0,
            correct_answers: 0,
            answered: false,
            responder_index: -1,
            pending_points: 0,
        }
    }

    pub fn is_credited(&self) -> bool {
        self.responder_index >= 0
    }
}

impl Default for ScoreData {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only session snapshot for the status query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub phase: Phase,
    pub mode: Mode,
    pub category: String,
    pub score_cap: i32,
    /// Present when the caller is a participant and signups have closed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answers: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prize_formula() {
        assert_eq!(prize_for_cap(20), 3);
        assert_eq!(prize_for_cap(35), 4);
        assert_eq!(prize_for_cap(50), 5);
    }

    #[test]
    fn test_category_lookup() {
        assert_eq!(category_label("rpm"), Some("Religion, Philosophy, and Myth"));
        assert_eq!(category_label("random"), Some("Random"));
        assert_eq!(category_label("cooking"), None);
    }

    #[test]
    fn test_score_cap_lookup() {
        assert_eq!(score_cap("short"), Some(20));
        assert_eq!(score_cap("marathon"), None);
    }
}
