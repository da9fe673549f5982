//! Request pipeline
//!
//! Every outgoing request goes through [`RequestPipeline::send`]: the loading
//! reference is acquired outermost and released on every exit path, failures
//! are classified and their UI action published, and the shared client's
//! cookie store carries the ambient session credential. Call sites obtain
//! request builders from the pipeline, so none of this can be bypassed.

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::debug;

use crate::classify::{Classified, UiAction, classify};
use crate::config::ApiConfig;
use crate::error::ClientError;
use crate::loading::LoadingCoordinator;

/// Capacity of the UI action broadcast channel
const ACTION_CHANNEL_CAPACITY: usize = 64;

/// Uniform wrapper around every outgoing request
///
/// Holds no request state of its own; it is pure composition of the loading
/// coordinator, the classifier, and the credential-carrying HTTP client.
pub struct RequestPipeline {
    http: reqwest::Client,
    base_url: String,
    loading: LoadingCoordinator,
    actions: broadcast::Sender<UiAction>,
}

impl RequestPipeline {
    /// Build the pipeline and its shared HTTP client
    ///
    /// The client is constructed with the cookie store enabled; the session
    /// cookie set by the login endpoint rides along on every later request.
    pub fn new(api: &ApiConfig, loading: LoadingCoordinator) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_millis(api.timeout_ms))
            .build()?;

        let (actions, _) = broadcast::channel(ACTION_CHANNEL_CAPACITY);

        Ok(Self {
            http,
            base_url: api.base_url.clone(),
            loading,
            actions,
        })
    }

    /// Subscribe to classified-error UI actions
    pub fn subscribe_actions(&self) -> broadcast::Receiver<UiAction> {
        self.actions.subscribe()
    }

    /// Builder for a GET against an API path (e.g. `/api/missions`)
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path))
    }

    /// Builder for a POST against an API path
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    /// Dispatch a request through the full pipeline
    ///
    /// Returns the response only for success statuses. Failures are classified,
    /// their carried action is published, and the classification is returned
    /// in the error. Transport failures with no status publish the `Unknown`
    /// notification.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let _guard = self.loading.begin_scoped();

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "send: transport failure");
                self.dispatch(&Classified::Unknown);
                return Err(ClientError::Network(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "send: success");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let classified = classify(status.as_u16(), &body);
        debug!(status = status.as_u16(), ?classified, "send: classified failure");
        self.dispatch(&classified);
        Err(ClientError::Http(classified))
    }

    /// GET a JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send(self.get(path)).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body and decode a JSON response
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        let response = self.send(self.post(path).json(body)).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body, discarding the response body
    pub async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ClientError> {
        self.send(self.post(path).json(body)).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn dispatch(&self, classified: &Classified) {
        let action = classified.action();
        debug!(?action, "dispatch: publishing ui action");
        // No subscribers is fine; the layer can run headless
        let _ = self.actions.send(action);
    }
}
