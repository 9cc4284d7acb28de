//! Pure per-mode scoring algorithms.
//!
//! These never touch session state; `GameSession`'s resolvers feed them the
//! numbers and apply the results.

use crate::types::UserId;
use std::time::Duration;

/// Timer-mode point value for a correct answer submitted `elapsed` after the
/// question was asked. The answering period is split into five equal slices
/// worth 5 down to 1 points; anything landing outside {1..5} earns nothing.
pub fn timer_points(elapsed: Duration, question_period: Duration) -> i32 {
    let slice = question_period.as_millis() / 5;
    if slice == 0 {
        return 0;
    }
    let raw = 5 - (elapsed.as_millis() / slice) as i64;
    if (1..=5).contains(&raw) {
        raw as i32
    } else {
        0
    }
}

/// Number-mode point value shared by every correct respondent in a round:
/// the fewer who got it right, the more each earns.
pub fn number_points(correct_responders: i32, participant_count: usize) -> i32 {
    let divisor = (participant_count.saturating_sub(1)).max(1) as f64;
    (5.0 - 4.0 * f64::from(correct_responders - 1) / divisor) as i32
}

/// Scans a round's credited participants for a game winner: score must
/// exceed `score_cap - 1`, and among candidates the earliest correct answer
/// (smallest responder index) wins.
pub struct WinnerScan {
    winner: Option<UserId>,
    best_score: i32,
    best_index: i32,
}

impl WinnerScan {
    pub fn new(score_cap: i32, correct_responders: i32) -> Self {
        Self {
            winner: None,
            best_score: score_cap - 1,
            best_index: correct_responders,
        }
    }

    /// Offer one credited participant to the scan.
    pub fn offer(&mut self, user: &UserId, score: i32, responder_index: i32) {
        if score > self.best_score && responder_index < self.best_index {
            self.winner = Some(user.clone());
            self.best_score = score;
            self.best_index = responder_index;
        }
    }

    /// The winner and their final score, if anyone cleared the cap.
    pub fn finish(self) -> Option<(UserId, i32)> {
        self.winner.map(|user| (user, self.best_score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(15_000);

    #[test]
    fn test_timer_points_early_answer_earns_five() {
        assert_eq!(timer_points(Duration::from_millis(1000), PERIOD), 5);
        assert_eq!(timer_points(Duration::from_millis(0), PERIOD), 5);
    }

    #[test]
    fn test_timer_points_decay_per_slice() {
        assert_eq!(timer_points(Duration::from_millis(3000), PERIOD), 4);
        assert_eq!(timer_points(Duration::from_millis(7500), PERIOD), 3);
        assert_eq!(timer_points(Duration::from_millis(13_000), PERIOD), 1);
        assert_eq!(timer_points(Duration::from_millis(14_999), PERIOD), 1);
    }

    #[test]
    fn test_timer_points_outside_range_earn_nothing() {
        // elapsed past the period computes to 0 or negative: no credit
        assert_eq!(timer_points(Duration::from_millis(15_000), PERIOD), 0);
        assert_eq!(timer_points(Duration::from_millis(60_000), PERIOD), 0);
    }

    #[test]
    fn test_number_points_scale_with_responders() {
        // 5 participants, 3 correct: floor(5 - 4*2/4) = 3
        assert_eq!(number_points(3, 5), 3);
        // sole correct respondent gets the full 5
        assert_eq!(number_points(1, 5), 5);
        // everyone correct gets 1
        assert_eq!(number_points(5, 5), 1);
    }

    #[test]
    fn test_number_points_guard_against_tiny_games() {
        // divisor clamps to 1 rather than dividing by zero
        assert_eq!(number_points(1, 1), 5);
        assert_eq!(number_points(1, 0), 5);
    }

    #[test]
    fn test_winner_scan_requires_cap_exceeded() {
        let mut scan = WinnerScan::new(20, 2);
        scan.offer(&"alice".to_string(), 19, 0);
        assert!(scan.finish().is_none());
    }

    #[test]
    fn test_winner_scan_earliest_responder_breaks_ties() {
        let mut scan = WinnerScan::new(20, 3);
        scan.offer(&"alice".to_string(), 22, 1);
        // same-or-lower score but later index never displaces
        scan.offer(&"bob".to_string(), 22, 2);
        assert_eq!(scan.finish(), Some(("alice".to_string(), 22)));
    }

    #[test]
    fn test_winner_scan_higher_score_needs_earlier_index() {
        let mut scan = WinnerScan::new(20, 3);
        scan.offer(&"alice".to_string(), 21, 0);
        // bob scored more but answered later; alice keeps the win
        scan.offer(&"bob".to_string(), 25, 2);
        assert_eq!(scan.finish(), Some(("alice".to_string(), 21)));
    }
}
