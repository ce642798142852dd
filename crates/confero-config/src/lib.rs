// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Confero operator console.
//!
//! TOML files merge across the XDG hierarchy with `CONFERO_*`
//! environment overrides on top; unknown keys are rejected with a
//! "did you mean" hint, and semantic validation collects every problem
//! in one pass instead of failing on the first.
//!
//! ```no_run
//! let config = confero_config::load_and_validate()
//!     .unwrap_or_else(|errors| {
//!         confero_config::render_errors(&errors);
//!         std::process::exit(1)
//!     });
//! println!("API base: {}", config.api.base_url);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::ConferoConfig;

/// Loads from the XDG hierarchy and environment, then validates.
///
/// Parse failures come back as diagnostics with typo suggestions;
/// semantic failures come back with every violation listed.
pub fn load_and_validate() -> Result<ConferoConfig, Vec<ConfigError>> {
    validated(loader::load_config())
}

/// Same pipeline over an inline TOML string, for tests and explicit
/// configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<ConferoConfig, Vec<ConfigError>> {
    validated(loader::load_config_from_str(toml_content))
}

fn validated(
    loaded: Result<ConferoConfig, figment::Error>,
) -> Result<ConferoConfig, Vec<ConfigError>> {
    let config = loaded.map_err(diagnostic::figment_to_config_errors)?;
    validation::validate_config(&config)?;
    Ok(config)
}
