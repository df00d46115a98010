//! Push channel wire protocol
//!
//! Every WebSocket text frame is a JSON object `{"event": <name>, "data": <payload>}`.

mod frames;

pub use frames::{ClientFrame, JoinWorkspace, ServerFrame};
