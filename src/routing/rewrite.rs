//! Upstream path rewriting.
//!
//! # Responsibilities
//! - Compile rewrite templates such as `/{segment}` against the pattern
//!   they are paired with
//! - Produce the upstream path for a matched request
//!
//! # Design Decisions
//! - Templates are compiled once at startup; a template referencing a
//!   capture its pattern does not define is a configuration error, never
//!   a runtime one
//! - Application is pure string assembly over the raw matched path, so
//!   rewriting the same match twice gives the same result

use thiserror::Error;

/// A template rejected at compile time.
#[derive(Debug, Error, PartialEq)]
pub enum RewriteError {
    #[error("rewrite template must begin with '/'")]
    NotAbsolute,

    #[error("unclosed '{{' in rewrite template")]
    UnclosedBrace,

    #[error("template references {placeholder:?} but the pattern captures {available:?}")]
    UnknownCapture {
        placeholder: String,
        available: Option<&'static str>,
    },
}

#[derive(Debug, Clone)]
enum Part {
    Literal(String),
    Capture,
}

/// A compiled rewrite template.
#[derive(Debug, Clone)]
pub struct RewriteTemplate {
    raw: String,
    parts: Vec<Part>,
}

impl RewriteTemplate {
    /// Compile a template against the capture its route's pattern
    /// provides (`None` for exact patterns).
    pub fn compile(template: &str, capture: Option<&'static str>) -> Result<Self, RewriteError> {
        if !template.starts_with('/') {
            return Err(RewriteError::NotAbsolute);
        }

        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            rest = &rest[open + 1..];

            let close = rest.find('}').ok_or(RewriteError::UnclosedBrace)?;
            let name = &rest[..close];
            if Some(name) != capture {
                return Err(RewriteError::UnknownCapture {
                    placeholder: name.to_string(),
                    available: capture,
                });
            }

            if !literal.is_empty() {
                parts.push(Part::Literal(std::mem::take(&mut literal)));
            }
            parts.push(Part::Capture);
            rest = &rest[close + 1..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Self {
            raw: template.to_string(),
            parts,
        })
    }

    /// Produce the upstream path for a captured remainder.
    pub fn apply(&self, capture: &str) -> String {
        let mut out = String::with_capacity(self.raw.len() + capture.len());
        for part in &self.parts {
            match part {
                Part::Literal(s) => out.push_str(s),
                Part::Capture => out.push_str(capture),
            }
        }
        out
    }
}

impl std::fmt::Display for RewriteTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
