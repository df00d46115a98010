//! OAuth callback service
//!
//! Completes a sign-in after the provider redirects back with an
//! authorization code.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use aimem_core::traits::AuthProvider;
use aimem_core::Session;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::error::{ServiceError, ServiceResult};

/// Query parameters of the callback redirect
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parse from a raw query string (`code=...&state=...`)
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = Some(value.into_owned()).filter(|v| !v.is_empty());
            match key.as_ref() {
                "code" => params.code = value,
                "state" => params.state = value,
                "error" => params.error = value,
                _ => {}
            }
        }
        params
    }
}

/// How a callback ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The code was exchanged for a new session
    Authenticated(Session),
    /// A session already existed; nothing was exchanged
    AlreadyAuthenticated,
}

/// Auth callback service
///
/// Handles at most one callback per instance; redirects can fire twice and
/// an authorization code can only be spent once.
pub struct AuthCallbackService {
    provider: Arc<dyn AuthProvider>,
    handled: AtomicBool,
}

impl AuthCallbackService {
    /// Create a new AuthCallbackService
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            handled: AtomicBool::new(false),
        }
    }

    /// Handle the callback redirect
    #[instrument(skip(self, params), fields(has_code = params.code.is_some()))]
    pub async fn handle_callback(&self, params: &CallbackParams) -> ServiceResult<CallbackOutcome> {
        if self.handled.swap(true, Ordering::SeqCst) {
            return Err(ServiceError::AlreadyHandled);
        }

        if self.provider.is_authenticated() {
            info!("Already authenticated, skipping code exchange");
            return Ok(CallbackOutcome::AlreadyAuthenticated);
        }

        if let Some(error) = &params.error {
            warn!(error = %error, "Provider returned an OAuth error");
            return Err(ServiceError::OAuth(error.clone()));
        }

        let code = params.code.as_deref().ok_or(ServiceError::MissingCode)?;

        match self.provider.exchange_code(code, params.state.as_deref()).await {
            Ok(session) => {
                info!(user_id = %session.user_id, "Signed in");
                Ok(CallbackOutcome::Authenticated(session))
            }
            // A concurrent exchange of the same code may have won the race.
            Err(e) if e.is_spent_code() && self.provider.is_authenticated() => {
                info!(error = %e, "Code already spent but session exists");
                Ok(CallbackOutcome::AlreadyAuthenticated)
            }
            Err(e) => {
                warn!(error = %e, "Code exchange failed");
                Err(e.into())
            }
        }
    }

    /// Check if a callback was already handled
    pub fn is_handled(&self) -> bool {
        self.handled.load(Ordering::SeqCst)
    }
}
