//! Timed, multi-round trivia competitions for chat rooms.
//!
//! The engine runs one session per room through signup, question delivery,
//! timed answer collection, mode-specific scoring, and win/stalemate/
//! inactivity detection, then folds finished games into persistent
//! standings. Command parsing, permission checks, and message rendering
//! belong to the host; it talks to the engine through [`SessionRegistry`]
//! and the capability traits in [`host`].

pub mod error;
pub mod host;
pub mod leaderboard;
pub mod protocol;
pub mod registry;
pub mod scoring;
pub mod session;
pub mod store;
pub mod text;
pub mod types;

pub use error::GameError;
pub use registry::SessionRegistry;
pub use session::SessionHandle;
pub use store::TriviaStore;
