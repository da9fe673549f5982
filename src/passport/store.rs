//! Passport store
//!
//! Single source of truth for "who is logged in". Every publish of the
//! identity is synchronously followed by a durable-storage write (or erase),
//! so a reload never observes state older than the last published value.

use std::sync::Arc;

use eyre::Context;
use tracing::{debug, warn};

use crate::pipeline::RequestPipeline;
use crate::signal::Signal;

use super::storage::PassportStorage;
use super::types::{Credentials, Passport, Registration};

const ME_PATH: &str = "/api/authentication/me";
const LOGIN_PATH: &str = "/api/authentication/login";
const REGISTER_PATH: &str = "/api/brawler/register";

/// Result of reading the durable passport record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// A well-formed record was found and published
    Found,
    /// No record exists; the session probe is worth trying
    NotFound,
    /// A record exists but did not parse; state left anonymous, no probe
    Corrupt,
}

/// Cached authenticated identity with durable persistence
pub struct PassportStore {
    pipeline: Arc<RequestPipeline>,
    storage: Arc<dyn PassportStorage>,
    data: Signal<Option<Passport>>,
    avatar: Signal<String>,
}

impl PassportStore {
    /// Construct the store and restore any persisted identity
    pub fn new(pipeline: Arc<RequestPipeline>, storage: Arc<dyn PassportStorage>) -> (Self, RestoreOutcome) {
        let store = Self {
            pipeline,
            storage,
            data: Signal::new(None),
            avatar: Signal::new(String::new()),
        };
        let outcome = store.restore();
        (store, outcome)
    }

    /// Application-start path: restore, then probe the backend session cookie
    /// if no record was persisted
    pub async fn bootstrap(pipeline: Arc<RequestPipeline>, storage: Arc<dyn PassportStorage>) -> Self {
        let (store, outcome) = Self::new(pipeline, storage);
        if outcome == RestoreOutcome::NotFound {
            store.probe_session().await;
        }
        store
    }

    /// Read and publish the persisted identity
    ///
    /// A corrupt record is swallowed: state is left anonymous and the outcome
    /// reports the failure without erroring.
    fn restore(&self) -> RestoreOutcome {
        let record = match self.storage.load() {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("restore: no persisted passport");
                return RestoreOutcome::NotFound;
            }
            Err(e) => {
                warn!(error = %e, "restore: storage read failed, treating as absent");
                return RestoreOutcome::NotFound;
            }
        };

        match serde_json::from_str::<Passport>(&record) {
            Ok(passport) => {
                debug!(id = passport.id, "restore: passport restored");
                self.publish(Some(passport));
                RestoreOutcome::Found
            }
            Err(e) => {
                warn!(error = %e, "restore: corrupt passport record, treating as absent");
                self.publish(None);
                RestoreOutcome::Corrupt
            }
        }
    }

    /// Ask the backend who the session cookie belongs to
    ///
    /// Absence of a session is the expected outcome here, not an error: any
    /// failure leaves state anonymous and is not surfaced to the caller.
    pub async fn probe_session(&self) {
        debug!("probe_session: called");
        match self.pipeline.get_json::<Passport>(ME_PATH).await {
            Ok(passport) => {
                debug!(id = passport.id, "probe_session: active session found");
                self.publish_and_persist(Some(passport));
            }
            Err(e) => {
                debug!(error = %e, "probe_session: no active session");
            }
        }
    }

    /// Submit credentials; `None` on success, user-facing message on failure
    ///
    /// Success publishes and persists the returned identity.
    pub async fn authenticate(&self, credentials: &Credentials) -> Option<String> {
        debug!(username = %credentials.username, "authenticate: called");
        match self.pipeline.post_json::<_, Passport>(LOGIN_PATH, credentials).await {
            Ok(passport) => {
                debug!(id = passport.id, "authenticate: logged in");
                self.publish_and_persist(Some(passport));
                None
            }
            Err(e) => {
                debug!(error = %e, "authenticate: rejected");
                Some(e.user_message())
            }
        }
    }

    /// Register a new profile; `None` on success, message on failure
    ///
    /// Does not authenticate: the caller still logs in afterwards.
    pub async fn register(&self, registration: &Registration) -> Option<String> {
        debug!(username = %registration.username, "register: called");
        match self.pipeline.post_unit(REGISTER_PATH, registration).await {
            Ok(()) => None,
            Err(e) => {
                debug!(error = %e, "register: rejected");
                Some(e.user_message())
            }
        }
    }

    /// Update the cached display name; the server call has already succeeded
    pub fn update_display_name(&self, name: &str) {
        if let Some(mut passport) = self.data.get() {
            passport.display_name = name.to_string();
            self.publish_and_persist(Some(passport));
        }
    }

    /// Update the cached avatar URL; the server call has already succeeded
    pub fn set_avatar(&self, url: &str) {
        if let Some(mut passport) = self.data.get() {
            passport.avatar_url = Some(url.to_string());
            self.publish_and_persist(Some(passport));
        }
    }

    /// Publish anonymous identity and erase the durable record. Used by logout.
    pub fn clear(&self) {
        debug!("clear: called");
        self.publish_and_persist(None);
    }

    /// Current identity; `None` means anonymous
    pub fn passport(&self) -> Option<Passport> {
        self.data.get()
    }

    /// Current display avatar URL; empty when anonymous
    pub fn avatar(&self) -> String {
        self.avatar.get()
    }

    /// Subscribe to identity changes
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<Option<Passport>> {
        self.data.subscribe()
    }

    /// Subscribe to avatar changes
    pub fn subscribe_avatar(&self) -> tokio::sync::watch::Receiver<String> {
        self.avatar.subscribe()
    }

    fn publish(&self, passport: Option<Passport>) {
        let avatar = passport
            .as_ref()
            .map(|p| p.avatar_or_default().to_string())
            .unwrap_or_default();
        self.avatar.set(avatar);
        self.data.set(passport);
    }

    fn publish_and_persist(&self, passport: Option<Passport>) {
        self.publish(passport.clone());

        let persisted = match &passport {
            Some(passport) => serde_json::to_string(passport)
                .context("Failed to serialize passport")
                .and_then(|record| self.storage.save(&record)),
            None => self.storage.erase(),
        };
        if let Err(e) = persisted {
            warn!(error = %e, "publish_and_persist: durable write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::loading::{LoadingCoordinator, NullIndicator};
    use crate::passport::storage::MemoryPassportStorage;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pipeline_for(base_url: String) -> Arc<RequestPipeline> {
        let api = ApiConfig {
            base_url,
            timeout_ms: 5_000,
        };
        let loading = LoadingCoordinator::new(Arc::new(NullIndicator), Duration::from_secs(10));
        Arc::new(RequestPipeline::new(&api, loading).expect("pipeline builds"))
    }

    fn offline_pipeline() -> Arc<RequestPipeline> {
        pipeline_for("http://127.0.0.1:1".to_string())
    }

    fn sample_passport_json() -> String {
        r#"{"id":5,"display_name":"chief","avatar_url":"https://img.example.com/c.png"}"#.to_string()
    }

    #[tokio::test]
    async fn test_restore_found_publishes_persisted_identity() {
        let storage = Arc::new(MemoryPassportStorage::with_record(sample_passport_json()));
        let (store, outcome) = PassportStore::new(offline_pipeline(), storage);

        assert_eq!(outcome, RestoreOutcome::Found);
        let passport = store.passport().expect("identity published");
        assert_eq!(passport.id, 5);
        assert_eq!(passport.display_name, "chief");
        assert_eq!(store.avatar(), "https://img.example.com/c.png");
    }

    #[tokio::test]
    async fn test_restore_derives_default_avatar() {
        let storage = Arc::new(MemoryPassportStorage::with_record(
            r#"{"id":2,"display_name":"scout"}"#,
        ));
        let (store, outcome) = PassportStore::new(offline_pipeline(), storage);

        assert_eq!(outcome, RestoreOutcome::Found);
        assert_eq!(store.avatar(), crate::passport::types::DEFAULT_AVATAR_URL);
    }

    #[tokio::test]
    async fn test_restore_absent_is_not_found() {
        let storage = Arc::new(MemoryPassportStorage::new());
        let (store, outcome) = PassportStore::new(offline_pipeline(), storage);

        assert_eq!(outcome, RestoreOutcome::NotFound);
        assert!(store.passport().is_none());
    }

    #[tokio::test]
    async fn test_restore_corrupt_record_leaves_state_anonymous() {
        let storage = Arc::new(MemoryPassportStorage::with_record("{not json"));
        let (store, outcome) = PassportStore::new(offline_pipeline(), storage);

        assert_eq!(outcome, RestoreOutcome::Corrupt);
        assert!(store.passport().is_none());
        assert_eq!(store.avatar(), "");
    }

    #[tokio::test]
    async fn test_authenticate_success_publishes_and_persists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/authentication/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string(sample_passport_json()))
            .mount(&server)
            .await;

        let pipeline = pipeline_for(server.uri());
        let storage = Arc::new(MemoryPassportStorage::new());
        let (store, _) = PassportStore::new(pipeline.clone(), storage.clone());

        let credentials = Credentials {
            username: "chief".to_string(),
            password: "hunter2".to_string(),
        };
        assert_eq!(store.authenticate(&credentials).await, None);
        assert_eq!(store.passport().map(|p| p.id), Some(5));

        // A fresh instance restores exactly what was just persisted
        let (fresh, outcome) = PassportStore::new(pipeline, storage);
        assert_eq!(outcome, RestoreOutcome::Found);
        assert_eq!(fresh.passport(), store.passport());
    }

    #[tokio::test]
    async fn test_authenticate_invalid_credentials_returns_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/authentication/login"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Record not found"))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryPassportStorage::new());
        let (store, _) = PassportStore::new(pipeline_for(server.uri()), storage);

        let credentials = Credentials {
            username: "chief".to_string(),
            password: "wrong".to_string(),
        };
        let message = store.authenticate(&credentials).await;
        assert_eq!(message.as_deref(), Some("Invalid username or password"));
        assert!(store.passport().is_none());
    }

    #[tokio::test]
    async fn test_register_success_does_not_authenticate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/brawler/register"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryPassportStorage::new());
        let (store, _) = PassportStore::new(pipeline_for(server.uri()), storage.clone());

        let registration = Registration {
            username: "rookie".to_string(),
            password: "hunter2".to_string(),
            display_name: "Rookie".to_string(),
        };
        assert_eq!(store.register(&registration).await, None);
        // Two-step flow: still anonymous, nothing persisted
        assert!(store.passport().is_none());
        assert!(storage.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_failure_returns_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/brawler/register"))
            .respond_with(ResponseTemplate::new(400).set_body_string("username already taken"))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryPassportStorage::new());
        let (store, _) = PassportStore::new(pipeline_for(server.uri()), storage);

        let registration = Registration {
            username: "rookie".to_string(),
            password: "hunter2".to_string(),
            display_name: "Rookie".to_string(),
        };
        assert_eq!(
            store.register(&registration).await.as_deref(),
            Some("username already taken")
        );
    }

    #[tokio::test]
    async fn test_clear_then_fresh_restore_is_not_found() {
        let storage = Arc::new(MemoryPassportStorage::with_record(sample_passport_json()));
        let pipeline = offline_pipeline();
        let (store, _) = PassportStore::new(pipeline.clone(), storage.clone());

        store.clear();
        assert!(store.passport().is_none());
        assert_eq!(store.avatar(), "");

        let (_fresh, outcome) = PassportStore::new(pipeline, storage);
        assert_eq!(outcome, RestoreOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_update_display_name_publishes_and_persists() {
        let storage = Arc::new(MemoryPassportStorage::with_record(sample_passport_json()));
        let (store, _) = PassportStore::new(offline_pipeline(), storage.clone());

        store.update_display_name("Field Chief");
        assert_eq!(store.passport().map(|p| p.display_name), Some("Field Chief".to_string()));
        assert!(storage.load().unwrap().unwrap().contains("Field Chief"));
    }

    #[tokio::test]
    async fn test_update_display_name_is_noop_when_anonymous() {
        let storage = Arc::new(MemoryPassportStorage::new());
        let (store, _) = PassportStore::new(offline_pipeline(), storage.clone());

        store.update_display_name("nobody");
        assert!(store.passport().is_none());
        assert!(storage.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_avatar_updates_derived_avatar() {
        let storage = Arc::new(MemoryPassportStorage::with_record(
            r#"{"id":2,"display_name":"scout"}"#,
        ));
        let (store, _) = PassportStore::new(offline_pipeline(), storage);

        store.set_avatar("https://img.example.com/new.png");
        assert_eq!(store.avatar(), "https://img.example.com/new.png");
    }

    #[tokio::test]
    async fn test_bootstrap_probes_when_nothing_persisted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/authentication/me"))
            .respond_with(ResponseTemplate::new(200).set_body_string(sample_passport_json()))
            .expect(1)
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryPassportStorage::new());
        let store = PassportStore::bootstrap(pipeline_for(server.uri()), storage.clone()).await;

        assert_eq!(store.passport().map(|p| p.id), Some(5));
        // Probed identity is persisted for the next start
        assert!(storage.load().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_bootstrap_probe_failure_stays_anonymous() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/authentication/me"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryPassportStorage::new());
        let store = PassportStore::bootstrap(pipeline_for(server.uri()), storage).await;

        assert!(store.passport().is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_does_not_probe_after_restore() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/authentication/me"))
            .respond_with(ResponseTemplate::new(200).set_body_string(sample_passport_json()))
            .expect(0)
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryPassportStorage::with_record(sample_passport_json()));
        let store = PassportStore::bootstrap(pipeline_for(server.uri()), storage).await;
        assert!(store.passport().is_some());
    }

    #[tokio::test]
    async fn test_bootstrap_does_not_probe_after_corrupt_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/authentication/me"))
            .respond_with(ResponseTemplate::new(200).set_body_string(sample_passport_json()))
            .expect(0)
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryPassportStorage::with_record("{not json"));
        let store = PassportStore::bootstrap(pipeline_for(server.uri()), storage).await;
        assert!(store.passport().is_none());
    }
}
