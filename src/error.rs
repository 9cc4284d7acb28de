use thiserror::Error;

/// User-input errors reported synchronously to the invoking caller.
/// None of these mutate session state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("There is already a trivia game in progress.")]
    AlreadyInProgress,

    #[error("There is no trivia game in progress.")]
    NoSession,

    #[error("\"{0}\" is not a valid category.")]
    InvalidCategory(String),

    #[error("There is no trivia game in its signup phase.")]
    NotSignupPhase,

    #[error("You have already signed up for this trivia game.")]
    AlreadySignedUp,

    #[error("Not enough users have signed up yet! Trivia games require at least three participants to run.")]
    NotEnoughParticipants,

    #[error("The trivia game requires at least three participants in order to run.")]
    KickBelowMinimum,

    #[error("User \"{0}\" does not exist.")]
    UnknownUser(String),

    #[error("User \"{0}\" is not a participant in this trivia game.")]
    NotAParticipant(String),

    #[error("There is no question to answer.")]
    NoActiveQuestion,

    #[error("You are not a participant in this trivia game.")]
    CallerNotParticipant,

    #[error("You have already submitted an answer for the current question.")]
    AlreadyAnswered,

    #[error("\"{0}\" is not a valid answer.")]
    InvalidAnswer(String),

    /// Operating on a session after it reached Ended is a dispatch-layer
    /// programming error, not a user error.
    #[error("This trivia game has already ended.")]
    SessionEnded,
}
