//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Matched request (rule + headers)
//!     → gate.rs (does this rule require auth?)
//!     → gate.rs (extract bearer credential)
//!     → TokenProvider::authenticate (validate, resolve session)
//!     → TokenProvider::relay_token (mint upstream token)
//!     → Some(AccessToken) attached to the outbound request
//!
//! Provider stack at startup:
//!     HttpTokenProvider (reqwest client against the identity service)
//!     → wrapped in TokenCache (per-session relay token reuse)
//!     → handed to AuthGate as Arc<dyn TokenProvider>
//! ```
//!
//! # Design Decisions
//! - The gate runs before any upstream I/O; rejected requests are free
//! - Everything behind `TokenProvider` is swappable; tests use in-process
//!   fakes instead of the HTTP client
//! - Provider outages fail closed (401), never open

pub mod cache;
pub mod gate;
pub mod provider;
pub mod token;

pub use cache::TokenCache;
pub use gate::AuthGate;
pub use provider::{HttpTokenProvider, ProviderConfigError};
pub use token::{AccessToken, AuthError, Session, TokenProvider};
