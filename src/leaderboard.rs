//! Persistent standings: folding finished sessions into the leaderboard and
//! rebuilding dense ranks plus the public top-15 ladder.

use crate::types::{ScoreData, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How many distinct rank groups the public ladder shows
pub const LADDER_SIZE: u32 = 15;

/// Cumulative standings for one user, keyed by userid in the persisted
/// document. Ranks are dense (ties share a rank, the next distinct value is
/// exactly one greater) and rebuilt after every finished game; 0 means a
/// rank has not been recorded yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// Prize points from winning games
    pub score: i32,
    /// Cumulative in-game points across all sessions
    pub total_score: i32,
    /// Cumulative correct answers across all sessions
    pub total_correct: i32,
    #[serde(default)]
    pub score_rank: u32,
    #[serde(default)]
    pub total_score_rank: u32,
    #[serde(default)]
    pub total_correct_rank: u32,
}

/// Rank groups ordered best-first; each group holds the userids tied at that
/// rank by leaderboard score.
pub type Ladder = Vec<Vec<UserId>>;

fn ranked_field(entry: &LeaderboardEntry, pass: usize) -> i32 {
    match pass {
        0 => entry.score,
        1 => entry.total_score,
        _ => entry.total_correct,
    }
}

/// Fold a finished session into the standings and rebuild ranks/ladder.
/// Runs exactly once per session, on entering Ended.
pub fn fold_session(
    leaderboard: &mut HashMap<UserId, LeaderboardEntry>,
    participants: &HashMap<UserId, ScoreData>,
    winner: Option<&UserId>,
    prize: i32,
) -> Ladder {
    for (user, data) in participants {
        if data.score == 0 {
            continue;
        }
        let entry = leaderboard.entry(user.clone()).or_default();
        entry.total_score += data.score;
        entry.total_correct += data.correct_answers;
    }

    if let Some(winner) = winner {
        leaderboard.entry(winner.clone()).or_default().score += prize;
    }

    rebuild_ranks(leaderboard)
}

/// Recompute all three dense rankings and return the rebuilt ladder.
pub fn rebuild_ranks(leaderboard: &mut HashMap<UserId, LeaderboardEntry>) -> Ladder {
    let mut users: Vec<UserId> = leaderboard.keys().cloned().collect();
    let mut ladder: Ladder = Vec::new();

    for pass in 0..3 {
        users.sort_by(|a, b| {
            let va = ranked_field(&leaderboard[a], pass);
            let vb = ranked_field(&leaderboard[b], pass);
            vb.cmp(&va).then_with(|| a.cmp(b))
        });

        let mut rank = 0u32;
        let mut last = i32::MIN;
        for user in &users {
            let value = ranked_field(&leaderboard[user], pass);
            if value != last {
                rank += 1;
                last = value;
                if pass == 0 && rank <= LADDER_SIZE {
                    ladder.push(Vec::new());
                }
            }
            if pass == 0 && rank <= LADDER_SIZE {
                ladder[rank as usize - 1].push(user.clone());
            }
            if let Some(entry) = leaderboard.get_mut(user) {
                match pass {
                    0 => entry.score_rank = rank,
                    1 => entry.total_score_rank = rank,
                    _ => entry.total_correct_rank = rank,
                }
            }
        }
    }

    ladder
}
