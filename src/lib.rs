//! waystation — an Anthropic-compatible gateway that multiplexes chat and
//! image requests across upstream accounts, hiding authentication,
//! per-account quota accounting, and rate-limit failover from the caller.
//!
//! The crate is organized leaves-first, mirroring the dependency order of
//! its components:
//!
//! - [`error`] — the closed error taxonomy and the upstream error classifier.
//! - [`providers`] — the `Provider` capability, its registry, and the
//!   public-model resolver.
//! - [`account`] — the account pool and the manager that owns its mutation.
//! - [`config`] — process-wide configuration, read once from the environment.
//! - [`server`] (behind the `server` feature) — the HTTP request pipeline:
//!   router, middleware, SSE framing, and handlers.
//!
//! Concrete `Provider` adapters for specific upstream APIs, and the OAuth
//! token source the account manager refreshes through, are deployment
//! concerns outside this crate — see [`providers::Provider`] and
//! [`account::TokenSource`].

pub mod account;
pub mod config;
pub mod error;
pub mod providers;
#[cfg(feature = "server")]
pub mod server;
pub mod telemetry;
pub mod types;

pub use error::{GatewayError, Result};
