//! Route table: ordered rules, lookup, and upstream targets.
//!
//! # Responsibilities
//! - Store compiled rules in declaration order
//! - Look up the matching rule for a request path
//! - Return the matched rule or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - First match wins; order is the whole precedence model, so the
//!   `/api/**` rule must precede the `/**` catch-all in the stock table
//! - O(n) rule scan (two rules in the stock table)

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;
use url::{Position, Url};

use crate::routing::matcher::{PathPattern, PatternError, PatternMatch};
use crate::routing::rewrite::{RewriteError, RewriteTemplate};

/// A problem with an origin string.
#[derive(Debug, Error)]
pub enum OriginError {
    #[error("not a valid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("unsupported scheme {scheme:?}; origins are plain http, TLS is terminated outside the gateway")]
    Scheme { scheme: String },

    #[error("origin must include a host")]
    MissingHost,

    #[error("origin must not carry a path, query, or fragment")]
    NotAnOrigin,
}

/// A rule rejected while compiling the table. These abort startup.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route {name:?}: invalid pattern: {source}")]
    Pattern {
        name: String,
        #[source]
        source: PatternError,
    },

    #[error("route {name:?}: malformed rewrite: {source}")]
    MalformedRewrite {
        name: String,
        #[source]
        source: RewriteError,
    },

    #[error("route {name:?}: invalid origin {value:?}: {source}")]
    Origin {
        name: String,
        value: String,
        #[source]
        source: OriginError,
    },
}

/// An upstream target: scheme and authority, nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    url: Url,
    authority: String,
}

impl Origin {
    /// Parse an origin such as `http://127.0.0.1:8081`.
    pub fn parse(value: &str) -> Result<Self, OriginError> {
        let url = Url::parse(value)?;

        if url.scheme() != "http" {
            return Err(OriginError::Scheme {
                scheme: url.scheme().to_string(),
            });
        }
        if url.host_str().is_none() {
            return Err(OriginError::MissingHost);
        }
        let bare_path = url.path().is_empty() || url.path() == "/";
        if !bare_path || url.query().is_some() || url.fragment().is_some() {
            return Err(OriginError::NotAnOrigin);
        }

        let authority = url[Position::BeforeHost..Position::AfterPort].to_string();
        Ok(Self { url, authority })
    }

    /// `host[:port]`, used for the outbound Host header, URI authority,
    /// and connection pool keys.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme(), self.authority)
    }
}

/// A single forwarding rule.
#[derive(Debug, Clone)]
pub struct RouteRule {
    name: String,
    pattern: PathPattern,
    upstream: Origin,
    rewrite: Option<RewriteTemplate>,
    requires_auth: bool,
}

impl RouteRule {
    /// Compile a rule. The rewrite template, when present, is checked
    /// against the pattern's capture here, so a bad pairing never reaches
    /// the request path.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        upstream: Origin,
        rewrite: Option<&str>,
        requires_auth: bool,
    ) -> Result<Self, RouteError> {
        let name = name.into();
        let pattern = PathPattern::parse(pattern).map_err(|source| RouteError::Pattern {
            name: name.clone(),
            source,
        })?;
        let rewrite = rewrite
            .map(|template| RewriteTemplate::compile(template, pattern.capture_name()))
            .transpose()
            .map_err(|source| RouteError::MalformedRewrite {
                name: name.clone(),
                source,
            })?;

        Ok(Self {
            name,
            pattern,
            upstream,
            rewrite,
            requires_auth,
        })
    }

    /// Rule identifier for logging and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn upstream(&self) -> &Origin {
        &self.upstream
    }

    /// Whether the auth gate must clear requests on this rule before
    /// dispatch.
    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }
}

/// A matched rule plus the capture backing its rewrite.
#[derive(Debug)]
pub struct RouteMatch<'t, 'p> {
    pub rule: &'t RouteRule,
    path: &'p str,
    capture: Option<&'p str>,
}

impl RouteMatch<'_, '_> {
    /// Path sent upstream: the rule's rewrite applied to the capture, or
    /// the original path unchanged when the rule declares no rewrite.
    pub fn target_path(&self) -> Cow<'_, str> {
        match (&self.rule.rewrite, self.capture) {
            (Some(template), Some(capture)) => Cow::Owned(template.apply(capture)),
            (Some(template), None) => Cow::Owned(template.apply("")),
            (None, _) => Cow::Borrowed(self.path),
        }
    }

    pub fn captured(&self) -> Option<&str> {
        self.capture
    }
}

/// Ordered, immutable set of forwarding rules.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Build a table from rules in precedence order.
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// The stock two-rule table: `/api/**` forwards to the API origin
    /// with the prefix stripped and authentication required; `/**`
    /// forwards everything else to the content origin untouched. The API
    /// rule comes first or the catch-all would swallow its traffic.
    pub fn standard(api_origin: &str, content_origin: &str) -> Result<Self, RouteError> {
        let api = parse_origin("api", api_origin)?;
        let content = parse_origin("content", content_origin)?;

        Ok(Self::new(vec![
            RouteRule::new("api", "/api/**", api, Some("/{segment}"), true)?,
            RouteRule::new("content", "/**", content, None, false)?,
        ]))
    }

    /// Find the first rule matching a raw request path.
    pub fn match_path<'t, 'p>(&'t self, path: &'p str) -> Option<RouteMatch<'t, 'p>> {
        for rule in &self.rules {
            if let Some(matched) = rule.pattern.matches(path) {
                let capture = match matched {
                    PatternMatch::Exact => None,
                    PatternMatch::Remainder(rest) => Some(rest),
                };
                return Some(RouteMatch {
                    rule,
                    path,
                    capture,
                });
            }
        }
        None
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn parse_origin(rule: &str, value: &str) -> Result<Origin, RouteError> {
    Origin::parse(value).map_err(|source| RouteError::Origin {
        name: rule.to_string(),
        value: value.to_string(),
        source,
    })
}
