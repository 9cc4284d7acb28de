//! Answer collection while a question is live.
//!
//! First mode is single-shot: one submission per participant per round, and
//! a correct one resolves the round on the spot. Timer and Number modes let
//! participants change their answer until the deadline; each resubmission
//! replaces the previous verdict.

use super::{GameSession, SessionHandle};
use crate::error::GameError;
use crate::scoring;
use crate::text::{answer_matches, to_id};
use crate::types::{Mode, Phase, UserId};
use std::sync::Arc;

impl SessionHandle {
    /// Record `user`'s answer to the live question. `Ok(())` acknowledges
    /// the submission whether or not it was correct; callers echo the choice
    /// back, never the verdict.
    pub async fn answer(self: &Arc<Self>, user: &UserId, text: &str) -> Result<(), GameError> {
        let mut state = self.state.lock().await;
        state.guard_live()?;
        if state.phase != Phase::Asking {
            return Err(GameError::NoActiveQuestion);
        }
        let Some(data) = state.participants.get(user) else {
            return Err(GameError::CallerNotParticipant);
        };
        if state.mode == Mode::First && data.answered {
            return Err(GameError::AlreadyAnswered);
        }

        let answer = to_id(text);
        if answer.is_empty() {
            return Err(GameError::InvalidAnswer(text.trim().to_string()));
        }
        let correct = state
            .current_answers
            .iter()
            .any(|accepted| answer_matches(&answer, accepted));

        match state.mode {
            Mode::First => {
                if let Some(data) = state.participants.get_mut(user) {
                    data.answered = true;
                }
                if correct {
                    self.first_answer(&mut state, user).await;
                }
                Ok(())
            }
            Mode::Timer | Mode::Number => {
                Self::replace_verdict(&mut state, user, correct);
                Ok(())
            }
        }
    }

    /// Timer/Number: apply a resubmittable verdict, undoing the previous one
    /// when the participant flips between correct and incorrect. Flips that
    /// change nothing just re-acknowledge.
    fn replace_verdict(state: &mut GameSession, user: &UserId, correct: bool) {
        let timer_mode = state.mode == Mode::Timer;
        let question_period = state.config.question_period;
        let elapsed = state.asked_at.map(|at| at.elapsed());
        let next_index = state.correct_responders;

        let Some(data) = state.participants.get_mut(user) else {
            return;
        };
        data.answered = true;

        if correct {
            if data.is_credited() {
                return;
            }
            data.responder_index = next_index;
            data.correct_answers += 1;
            if timer_mode {
                if let Some(elapsed) = elapsed {
                    let points = scoring::timer_points(elapsed, question_period);
                    if points > 0 {
                        data.score += points;
                        data.pending_points = points;
                    }
                }
            }
            state.correct_responders += 1;
        } else {
            if !data.is_credited() {
                return;
            }
            data.responder_index = -1;
            data.correct_answers -= 1;
            if timer_mode {
                data.score -= data.pending_points;
                data.pending_points = 0;
            }
            state.correct_responders -= 1;
        }
    }
}
