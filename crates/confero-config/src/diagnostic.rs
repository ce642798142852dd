// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnostic rendering for configuration failures.
//!
//! Figment reports deserialization problems as a flat error chain; this
//! module turns each entry into a [`ConfigError`] that miette can render
//! nicely, including a fuzzy-matched "did you mean" hint for misspelled
//! keys.

use miette::Diagnostic;
use thiserror::Error;

// Jaro-Winkler floor below which a key is considered unrelated rather
// than a typo.
const TYPO_FLOOR: f64 = 0.75;

/// A configuration problem, ready for miette rendering.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key the section does not define.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(confero::config::unknown_key),
        help("{}", unknown_key_hint(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest valid key, when one is plausible.
        suggestion: Option<String>,
        /// Comma-separated keys the section accepts.
        valid_keys: String,
    },

    /// A value of the wrong TOML type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(confero::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A key the schema requires but the merged config lacks.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(confero::config::missing_key),
        help("add `{key} = <value>` to your confero.toml")
    )]
    MissingKey { key: String },

    /// A value that parsed but fails a semantic constraint.
    #[error("validation error: {message}")]
    #[diagnostic(code(confero::config::validation))]
    Validation { message: String },

    /// Anything figment reports that has no dedicated variant.
    #[error("configuration error: {0}")]
    #[diagnostic(code(confero::config::other))]
    Other(String),
}

fn unknown_key_hint(suggestion: Option<&str>, valid_keys: &str) -> String {
    suggestion
        .map(|s| format!("did you mean `{s}`? Valid keys: {valid_keys}"))
        .unwrap_or_else(|| format!("valid keys: {valid_keys}"))
}

/// Explodes a figment error chain into per-problem diagnostics.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter().map(classify).collect()
}

fn classify(entry: figment::Error) -> ConfigError {
    use figment::error::Kind;

    match &entry.kind {
        Kind::UnknownField(field, accepted) => ConfigError::UnknownKey {
            key: field.clone(),
            suggestion: suggest_key(field, accepted),
            valid_keys: accepted.join(", "),
        },
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: field.clone().into_owned(),
        },
        Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
            key: dotted_path(&entry),
            detail: format!("found {actual}, expected {expected}"),
            expected: expected.to_string(),
        },
        _ => ConfigError::Other(entry.to_string()),
    }
}

fn dotted_path(entry: &figment::Error) -> String {
    entry.path.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(".")
}

/// Picks the valid key closest to `unknown`, if any clears the typo
/// floor.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > TYPO_FLOOR)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Prints every diagnostic to stderr through miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}
