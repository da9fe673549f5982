//! Failed-response classification
//!
//! Pure mapping from an HTTP status code and raw body to a discrete outcome
//! plus the UI action it carries. The classifier never performs the action
//! itself; the request pipeline executes it.

use thiserror::Error;

/// Raw body the backend returns when credentials do not match a record
const CREDENTIAL_FAILURE_BODY: &str = "Record not found";

/// User-facing substitution for the credential-failure sentinel
const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Fallback message for a 400 with an empty body
const GENERIC_BAD_REQUEST_MESSAGE: &str = "bad request";

/// Message for 401 responses
const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Message for statuses outside the handled set
const UNKNOWN_MESSAGE: &str = "something went wrong, please try again later";

/// Discrete classification of a failed request
///
/// Total over all status codes: anything not explicitly handled is `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Classified {
    /// 400 with a user-facing message (sentinel-substituted or verbatim body)
    #[error("{0}")]
    BadRequest(String),

    /// 401
    #[error("{UNAUTHORIZED_MESSAGE}")]
    Unauthorized,

    /// 404
    #[error("not found")]
    NotFound,

    /// 500..=511, carrying the raw response body as diagnostic detail
    #[error("server error: {0}")]
    ServerError(String),

    /// Any other status, including transport failures with no status at all
    #[error("{UNKNOWN_MESSAGE}")]
    Unknown,
}

/// Navigation target carried by classifications that leave the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavTarget {
    /// The not-found view
    NotFound,
    /// The server-error view, with the response body passed as navigation state
    ServerError { detail: String },
}

/// UI action a classification carries
///
/// Observed by the view layer through the pipeline's event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    /// Show a transient notification with this text
    Notify(String),
    /// Navigate away from the current view
    Navigate(NavTarget),
}

/// Classify a failed response by status code and raw body
///
/// First-match order: 400, 404, 401, 500..=511, then `Unknown`.
pub fn classify(status: u16, body: &str) -> Classified {
    match status {
        400 => {
            let message = if body == CREDENTIAL_FAILURE_BODY {
                INVALID_CREDENTIALS_MESSAGE.to_string()
            } else if !body.is_empty() {
                body.to_string()
            } else {
                GENERIC_BAD_REQUEST_MESSAGE.to_string()
            };
            Classified::BadRequest(message)
        }
        404 => Classified::NotFound,
        401 => Classified::Unauthorized,
        500..=511 => Classified::ServerError(body.to_string()),
        _ => Classified::Unknown,
    }
}

impl Classified {
    /// The UI action this classification carries
    pub fn action(&self) -> UiAction {
        match self {
            Classified::BadRequest(message) => UiAction::Notify(message.clone()),
            Classified::Unauthorized => UiAction::Notify(UNAUTHORIZED_MESSAGE.to_string()),
            Classified::NotFound => UiAction::Navigate(NavTarget::NotFound),
            Classified::ServerError(detail) => UiAction::Navigate(NavTarget::ServerError {
                detail: detail.clone(),
            }),
            Classified::Unknown => UiAction::Notify(UNKNOWN_MESSAGE.to_string()),
        }
    }

    /// The inline message for user-correctable failures, if any
    ///
    /// Used by callers that render errors next to a form instead of reacting
    /// to the broadcast action.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Classified::BadRequest(message) => Some(message.clone()),
            Classified::Unauthorized => Some(UNAUTHORIZED_MESSAGE.to_string()),
            Classified::Unknown => Some(UNKNOWN_MESSAGE.to_string()),
            Classified::NotFound | Classified::ServerError(_) => None,
        }
    }
}
