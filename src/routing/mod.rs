//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → table.rs (ordered rule scan, first match wins)
//!     → matcher.rs (pattern match, glob capture)
//!     → rewrite.rs (upstream path from the capture)
//!     → Return: RouteMatch or no-match (404)
//!
//! Table compilation (at startup):
//!     origin strings + rule definitions
//!     → Parse origins, patterns, rewrite templates
//!     → Any error aborts startup
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in the hot path (prefix matching only)
//! - Deterministic: same path always matches the same rule
//! - First match wins (declaration order)

pub mod matcher;
pub mod rewrite;
pub mod table;

pub use matcher::{PathPattern, PatternError, PatternMatch};
pub use rewrite::{RewriteError, RewriteTemplate};
pub use table::{Origin, OriginError, RouteError, RouteMatch, RouteRule, RouteTable};
