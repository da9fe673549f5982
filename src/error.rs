//! Crate error types

use thiserror::Error;

use crate::classify::Classified;

/// Errors surfaced by the request pipeline and session store
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (no HTTP status was received)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status, already classified
    #[error("request failed: {0}")]
    Http(Classified),
}

impl ClientError {
    /// The classification, if this error came from an HTTP status
    pub fn classified(&self) -> Option<&Classified> {
        match self {
            ClientError::Http(classified) => Some(classified),
            _ => None,
        }
    }

    /// The inline user-facing message, if one applies
    ///
    /// Transport and decode failures fall back to the generic retry-later
    /// message so login/registration forms always have something to render.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Http(classified) => classified
                .user_message()
                .unwrap_or_else(|| classified.to_string()),
            ClientError::Network(_) => Classified::Unknown.to_string(),
        }
    }
}
