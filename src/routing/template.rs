//! Path template compilation.
//!
//! # Responsibilities
//! - Normalize raw templates and request paths the same way
//! - Split templates into literal and `{name}` parameter segments
//! - Reject templates that declare the same parameter twice
//!
//! # Design Decisions
//! - Literal segments compare case-insensitively
//! - Parameter values keep the request's casing
//! - Request segments are percent-decoded one at a time, so `%2F` never splits a segment
//! - A parameter must occupy a whole segment (`/foo-{id}` is a literal)
//! - No wildcard, optional or repeated segments

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use percent_encoding::percent_decode_str;
use thiserror::Error;

/// Configuration-time failure while compiling a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedTemplateError {
    /// The same parameter name appears in more than one segment.
    #[error("template '{template}' declares parameter '{name}' more than once")]
    DuplicateParameter { template: String, name: String },
}

/// Normalize a path or template: trimmed, exactly one leading `/`,
/// one trailing `/` stripped unless the result is the root.
pub fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('/');
    let mut normalized = format!("/{}", trimmed);
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Split a normalized path into its segments. The root has none.
pub(crate) fn segments(normalized: &str) -> Vec<&str> {
    if normalized == "/" {
        return Vec::new();
    }
    normalized[1..].split('/').collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Lower-cased literal text.
    Literal(String),
    /// Index into `RouteTemplate::parameters`.
    Parameter(usize),
}

/// A compiled, immutable path template.
#[derive(Debug, Clone)]
pub struct RouteTemplate {
    raw: String,
    normalized: String,
    segments: Vec<Segment>,
    parameters: Vec<String>,
}

impl RouteTemplate {
    /// Compile a raw template such as `/realms/{realmId}/clients`.
    pub fn compile(raw: &str) -> Result<Self, MalformedTemplateError> {
        let normalized_cased = normalize_path(raw);
        let mut compiled = Vec::new();
        let mut parameters: Vec<String> = Vec::new();
        let mut seen = HashSet::new();

        for segment in segments(&normalized_cased) {
            match parameter_name(segment) {
                Some(name) => {
                    if !seen.insert(name.to_lowercase()) {
                        return Err(MalformedTemplateError::DuplicateParameter {
                            template: raw.to_string(),
                            name: name.to_string(),
                        });
                    }
                    compiled.push(Segment::Parameter(parameters.len()));
                    parameters.push(name.to_string());
                }
                None => compiled.push(Segment::Literal(segment.to_lowercase())),
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            normalized: normalized_cased.to_lowercase(),
            segments: compiled,
            parameters,
        })
    }

    /// The template exactly as registered.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Normalized, case-folded form used for structural comparison.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Parameter slot names in declared case, ordered by position.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Match an already-normalized, case-preserved path.
    ///
    /// Returns the decoded captured values keyed by lower-cased slot name, or
    /// `None` if the path is not structurally equal to this template.
    pub fn capture(&self, normalized_path: &str) -> Option<HashMap<String, String>> {
        let path_segments = segments(normalized_path);
        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut values = HashMap::with_capacity(self.parameters.len());
        for (expected, raw) in self.segments.iter().zip(path_segments) {
            let actual = decode_segment(raw);
            match expected {
                Segment::Literal(literal) => {
                    if *literal != actual.to_lowercase() {
                        return None;
                    }
                }
                Segment::Parameter(index) => {
                    if actual.is_empty() {
                        return None;
                    }
                    values.insert(self.parameters[*index].to_lowercase(), actual.into_owned());
                }
            }
        }
        Some(values)
    }
}

/// Percent-decode one path segment. Invalid UTF-8 is replaced, not rejected.
fn decode_segment(segment: &str) -> Cow<'_, str> {
    percent_decode_str(segment).decode_utf8_lossy()
}

/// `{identifier}` where the identifier is one or more word characters.
fn parameter_name(segment: &str) -> Option<&str> {
    let name = segment.strip_prefix('{')?.strip_suffix('}')?;
    if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        Some(name)
    } else {
        None
    }
}
