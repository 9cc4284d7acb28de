//! Round resolution: what happens when a deadline fires (or a First-mode
//! answer short-circuits it), and every path into the terminal Ended phase.

use super::{GameSession, SessionHandle, INACTIVITY_LIMIT};
use crate::protocol::{GameEvent, PointsGroup};
use crate::scoring::{self, WinnerScan};
use crate::types::{category_label, Mode, Phase, UserId};
use std::sync::Arc;
use tokio::time::Instant;

impl SessionHandle {
    /// Draw the next question and open the answering period. An exhausted
    /// queue is a stalemate, not an error.
    pub(crate) async fn ask_question(self: &Arc<Self>, state: &mut GameSession) {
        let Some(question) = state.question_queue.pop() else {
            self.sink.deliver(self.room(), GameEvent::Stalemate);
            self.finish(state, None).await;
            return;
        };

        state.current_answers = question.answers;
        state.phase = Phase::Asking;
        if state.mode == Mode::Timer {
            state.asked_at = Some(Instant::now());
        }

        self.sink.deliver(
            self.room(),
            GameEvent::Question {
                question: question.question,
                category: category_label(&question.category)
                    .map(str::to_string)
                    .unwrap_or(question.category),
            },
        );
        self.schedule(state, state.config.question_period);
    }

    /// Shared resolution for a round nobody got right: clear the answered
    /// flags and track inactivity, ending the game after seven silent
    /// rounds in a row.
    pub(crate) async fn no_answer(self: &Arc<Self>, state: &mut GameSession) {
        state.phase = Phase::Intermission;

        let mut any_answered = false;
        for data in state.participants.values_mut() {
            if data.answered {
                data.answered = false;
                any_answered = true;
            }
        }

        if any_answered {
            state.inactivity_counter = 0;
        } else {
            state.inactivity_counter += 1;
            if state.inactivity_counter == INACTIVITY_LIMIT {
                self.sink.deliver(self.room(), GameEvent::InactivityEnd);
                self.finish(state, None).await;
                return;
            }
        }

        self.sink.deliver(
            self.room(),
            GameEvent::NoAnswer {
                answers: state.current_answers.clone(),
            },
        );
        self.schedule(state, state.config.intermission_period);
    }

    /// First mode: a correct answer resolves the round on the spot.
    pub(crate) async fn first_answer(self: &Arc<Self>, state: &mut GameSession, user: &UserId) {
        state.cancel_deadline();
        state.phase = Phase::Intermission;

        let Some(data) = state.participants.get_mut(user) else {
            return;
        };
        data.score += 5;
        data.correct_answers += 1;
        let score = data.score;

        self.sink.deliver(
            self.room(),
            GameEvent::FirstCorrect {
                user: self.name_of(user),
                answers: state.current_answers.clone(),
                points: 5,
            },
        );

        if score >= state.score_cap {
            self.win(state, user.clone(), score).await;
            return;
        }

        for data in state.participants.values_mut() {
            data.answered = false;
        }
        state.inactivity_counter = 0;
        self.schedule(state, state.config.intermission_period);
    }

    /// Timer mode deadline: summarize who earned what, then look for a
    /// winner among the still-credited participants.
    pub(crate) async fn timer_answers(self: &Arc<Self>, state: &mut GameSession) {
        if state.correct_responders == 0 {
            self.no_answer(state).await;
            return;
        }
        state.phase = Phase::Intermission;

        let mut scan = WinnerScan::new(state.score_cap, state.correct_responders);
        let mut groups: Vec<PointsGroup> = (1..=5)
            .rev()
            .map(|points| PointsGroup {
                points,
                users: Vec::new(),
            })
            .collect();

        for (user, data) in state.participants.iter_mut() {
            data.answered = false;
            if !data.is_credited() {
                continue;
            }
            if let Some(group) = groups.iter_mut().find(|g| g.points == data.pending_points) {
                group.users.push(self.name_of(user));
            }
            scan.offer(user, data.score, data.responder_index);
            data.pending_points = 0;
            data.responder_index = -1;
        }
        groups.retain(|group| !group.users.is_empty());

        self.sink.deliver(
            self.room(),
            GameEvent::TimerResults {
                answers: state.current_answers.clone(),
                groups,
            },
        );

        if let Some((winner, score)) = scan.finish() {
            self.win(state, winner, score).await;
            return;
        }

        state.inactivity_counter = 0;
        state.correct_responders = 0;
        self.schedule(state, state.config.intermission_period);
    }

    /// Number mode deadline: every credited participant earns the same
    /// share, sized by how many got it right.
    pub(crate) async fn number_answers(self: &Arc<Self>, state: &mut GameSession) {
        if state.correct_responders == 0 {
            self.no_answer(state).await;
            return;
        }
        state.phase = Phase::Intermission;

        let points = scoring::number_points(state.correct_responders, state.participants.len());
        let mut scan = WinnerScan::new(state.score_cap, state.correct_responders);
        let mut credited = Vec::new();

        for (user, data) in state.participants.iter_mut() {
            data.answered = false;
            if !data.is_credited() {
                continue;
            }
            credited.push(self.name_of(user));
            data.score += points;
            scan.offer(user, data.score, data.responder_index);
            data.responder_index = -1;
        }

        self.sink.deliver(
            self.room(),
            GameEvent::NumberResults {
                answers: state.current_answers.clone(),
                users: credited,
                points,
            },
        );

        if let Some((winner, score)) = scan.finish() {
            self.win(state, winner, score).await;
            return;
        }

        state.inactivity_counter = 0;
        state.correct_responders = 0;
        self.schedule(state, state.config.intermission_period);
    }

    async fn win(self: &Arc<Self>, state: &mut GameSession, winner: UserId, score: i32) {
        self.sink.deliver(
            self.room(),
            GameEvent::GameWon {
                user: self.name_of(&winner),
                score,
                prize: state.prize,
            },
        );
        self.finish(state, Some(winner)).await;
    }

    /// The only way into Ended. Folds the session into the persistent
    /// standings exactly once, then removes the session from the registry so
    /// no further operations can reach it.
    pub(crate) async fn finish(&self, state: &mut GameSession, winner: Option<UserId>) {
        state.cancel_deadline();
        state.phase = Phase::Ended;

        self.store
            .record_results(&state.participants, winner.as_ref(), state.prize)
            .await;
        self.store.request_save().await;

        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.room()).await;
        }
        tracing::info!(room = %self.room(), winner = ?winner, "trivia game ended");
    }
}
