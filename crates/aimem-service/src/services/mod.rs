//! Business logic services
//!
//! Orchestrate the collaborator traits and the shared query cache.

pub mod auth_callback;
pub mod error;
pub mod thoughts;

pub use auth_callback::{AuthCallbackService, CallbackOutcome, CallbackParams};
pub use error::{ServiceError, ServiceResult};
pub use thoughts::ThoughtQueries;
