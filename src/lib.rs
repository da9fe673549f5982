//! mission-client - request/session coordination layer
//!
//! The client-side plumbing shared by every screen of the mission
//! crew-management app: who is logged in, whether anything is loading, and
//! what to do when a request fails.
//!
//! # Core Concepts
//!
//! - **One pipeline for every request**: loading tracking, error
//!   classification, and the ambient session credential cannot be bypassed
//! - **Publish then persist**: the cached identity is written durably on
//!   every mutation, so a reload never sees stale state
//! - **Saturating counter, watchdog-backed**: the busy indicator shows for
//!   the union of concurrent requests and can never get stuck
//!
//! # Modules
//!
//! - [`passport`] - session store with durable persistence
//! - [`loading`] - reference-counted busy indicator with watchdog recovery
//! - [`classify`] - total classification of failed responses
//! - [`pipeline`] - uniform request wrapper composing the above
//! - [`services`] - application-start wiring
//! - [`config`] - configuration types and loading
//! - [`signal`] - typed publisher for reactive reads

pub mod classify;
pub mod config;
pub mod error;
pub mod loading;
pub mod passport;
pub mod pipeline;
pub mod services;
pub mod signal;

pub use classify::{Classified, NavTarget, UiAction, classify};
pub use config::ClientConfig;
pub use error::ClientError;
pub use loading::{BusyIndicator, LoadingCoordinator, LoadingGuard, NullIndicator};
pub use passport::{Credentials, Passport, PassportStore, Registration, RestoreOutcome};
pub use pipeline::RequestPipeline;
pub use services::Services;
pub use signal::Signal;
