//! Error taxonomy for template compilation and engine mutation.
//!
//! `search` never returns a `Result` — a non-match is `found = false` on the
//! `SearchResult`, per the zero-allocation, never-throws contract on the hot
//! path. Everything that can fail is a compile-time or mutation-time
//! operation, reported here.

use std::fmt;

/// Why a template failed to compile, and at which byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateErrorReason {
    /// A `{` was never closed by a matching `}` before the next delimiter.
    UnclosedBrace,
    /// `{}` — a parameter name must be non-empty.
    EmptyParamName,
    /// A parameter name contains a byte outside `[A-Za-z0-9_]`.
    InvalidParamChar,
    /// The same parameter name appears twice in one template.
    DuplicateParamName,
    /// A byte outside the ASCII range appeared in the template.
    NonAscii,
    /// A `\` appeared as the final byte of the template with nothing to escape.
    TrailingEscape,
    /// `*` appeared somewhere other than as the final byte, directly
    /// preceded by the delimiter.
    WildcardNotTrailing,
    /// A `}` appeared without a matching open `{`.
    StrayRBrace,
    /// Two `{param}` segments appear back to back with no literal between them.
    AdjacentParams,
    /// The template doesn't start with the engine's delimiter byte.
    MissingLeadingDelimiter,
}

impl fmt::Display for TemplateErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TemplateErrorReason::UnclosedBrace => "unclosed '{'",
            TemplateErrorReason::EmptyParamName => "empty parameter name",
            TemplateErrorReason::InvalidParamChar => "parameter name contains an invalid character",
            TemplateErrorReason::DuplicateParamName => "duplicate parameter name in template",
            TemplateErrorReason::NonAscii => "non-ASCII byte in template",
            TemplateErrorReason::TrailingEscape => "trailing '\\' with nothing to escape",
            TemplateErrorReason::WildcardNotTrailing => "'*' is only valid as a trailing wildcard",
            TemplateErrorReason::StrayRBrace => "'}' without a matching '{'",
            TemplateErrorReason::AdjacentParams => "adjacent parameters with no literal between them",
            TemplateErrorReason::MissingLeadingDelimiter => "template must start with the delimiter byte",
        };
        f.write_str(text)
    }
}

/// Everything that can go wrong building or mutating an [`crate::Engine`].
#[derive(Debug, thiserror::Error)]
pub enum PathForgeError {
    #[error("delimiter must be one of '/', ':' or '|'")]
    InvalidDelimiter,

    #[error("engine is frozen; insert/delete are no longer permitted")]
    Frozen,

    #[error("invalid template at byte {index}: {reason}")]
    InvalidTemplate {
        reason: TemplateErrorReason,
        index: usize,
    },

    #[error("template already registered")]
    Duplicate,

    #[error("node already holds the maximum of 4 param variants")]
    TooManyParamVariants,

    #[error("template intern map was dropped; operation unavailable")]
    Unavailable,
}
