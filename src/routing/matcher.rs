//! Path pattern matching.
//!
//! # Responsibilities
//! - Parse route patterns: exact paths and trailing `/**` globs
//! - Match raw request paths, capturing the glob remainder
//!
//! # Design Decisions
//! - Path matching is case-sensitive and byte-wise; percent-encoded
//!   paths are matched as received, never decoded
//! - `/**` only at the end of a pattern; no regex, so matching stays O(n)
//!   in the path length
//! - The glob capture is named `segment`, which is the name rewrite
//!   templates substitute

use std::fmt;

use thiserror::Error;

/// A pattern rejected at parse time.
#[derive(Debug, Error, PartialEq)]
pub enum PatternError {
    #[error("pattern must begin with '/'")]
    NotAbsolute,

    #[error("'**' is only supported as a trailing '/**' glob")]
    MisplacedGlob,
}

/// A compiled route pattern: either an exact path or a prefix glob such
/// as `/api/**`.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    prefix: String,
    glob: bool,
}

/// Outcome of a successful match.
#[derive(Debug, PartialEq)]
pub enum PatternMatch<'p> {
    /// An exact pattern matched; nothing was captured.
    Exact,
    /// A glob pattern matched; holds the path remainder after the prefix,
    /// without its leading slash. Matching the bare prefix captures "".
    Remainder(&'p str),
}

impl PathPattern {
    /// Parse a pattern string.
    ///
    /// `/**` matches every path. `/api/**` matches `/api` and everything
    /// below it. A pattern without a glob matches exactly one path.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::NotAbsolute);
        }

        if let Some(prefix) = pattern.strip_suffix("/**") {
            if prefix.contains('*') {
                return Err(PatternError::MisplacedGlob);
            }
            return Ok(Self {
                raw: pattern.to_string(),
                prefix: prefix.to_string(),
                glob: true,
            });
        }

        if pattern.contains('*') {
            return Err(PatternError::MisplacedGlob);
        }

        Ok(Self {
            raw: pattern.to_string(),
            prefix: pattern.to_string(),
            glob: false,
        })
    }

    /// Name of the capture this pattern produces, if any. Rewrite
    /// templates may only reference this name.
    pub fn capture_name(&self) -> Option<&'static str> {
        self.glob.then_some("segment")
    }

    /// Match a raw request path.
    ///
    /// The remainder starts after the prefix's trailing slash: for
    /// `/api/**`, `/api/a/b` captures `a/b`, `/api/` and `/api` both
    /// capture `""`, and `/apix` does not match at all.
    pub fn matches<'p>(&self, path: &'p str) -> Option<PatternMatch<'p>> {
        if !path.starts_with('/') {
            return None;
        }

        if !self.glob {
            return (path == self.prefix).then_some(PatternMatch::Exact);
        }

        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            return Some(PatternMatch::Remainder(""));
        }
        rest.strip_prefix('/').map(PatternMatch::Remainder)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
