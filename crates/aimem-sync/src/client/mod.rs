//! Sync client facade
//!
//! Ties a transport, the router, the shared cache, and presence together
//! behind a small lifecycle API.

mod policy;
mod status;
mod sync_client;

pub use policy::ReconnectPolicy;
pub use status::ConnectionStatus;
pub use sync_client::SyncClient;
