//! # aimem-service
//!
//! Application layer: read-through thought queries over the shared cache,
//! the OAuth callback flow, and the HTTP implementation of the document store.

pub mod services;
pub mod store;

pub use services::{
    AuthCallbackService, CallbackOutcome, CallbackParams, ServiceError, ServiceResult,
    ThoughtQueries,
};
pub use store::HttpDocumentStore;
