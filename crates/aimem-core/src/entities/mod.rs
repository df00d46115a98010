//! Domain entities - core business objects

mod session;
mod thought;

pub use session::Session;
pub use thought::{Thought, ThoughtPatch};
