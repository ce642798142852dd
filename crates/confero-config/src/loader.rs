// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading.
//!
//! Figment merges compiled defaults, the TOML file hierarchy, and
//! `CONFERO_*` environment variables, later layers overriding earlier
//! ones.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;

use crate::model::ConferoConfig;

/// TOML files consulted in override order: system-wide first, then the
/// user's XDG config, then the working directory.
fn config_file_hierarchy() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from("/etc/confero/confero.toml")];
    if let Some(xdg) = dirs::config_dir() {
        files.push(xdg.join("confero/confero.toml"));
    }
    files.push(PathBuf::from("confero.toml"));
    files
}

/// Loads the effective configuration: defaults, then the file
/// hierarchy, then `CONFERO_*` environment variables on top.
pub fn load_config() -> Result<ConferoConfig, figment::Error> {
    let mut figment = Figment::from(Serialized::defaults(ConferoConfig::default()));
    for file in config_file_hierarchy() {
        figment = figment.merge(Toml::file(file));
    }
    figment.merge(env_provider()).extract()
}

/// Loads from a TOML string alone, skipping files and environment.
/// The test entry point.
pub fn load_config_from_str(toml_content: &str) -> Result<ConferoConfig, figment::Error> {
    Figment::from(Serialized::defaults(ConferoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Loads one explicit file (plus defaults and environment overrides),
/// bypassing the hierarchy.
pub fn load_config_from_path(path: &Path) -> Result<ConferoConfig, figment::Error> {
    Figment::from(Serialized::defaults(ConferoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment overrides under the `CONFERO_` prefix.
///
/// Section names are mapped with an explicit prefix table instead of
/// `Env::split("_")`: key names themselves contain underscores, so
/// `CONFERO_API_BASE_URL` must become `api.base_url`, not `api.base.url`.
fn env_provider() -> Env {
    const SECTIONS: &[&str] = &["operator", "api", "realtime", "sync", "call"];

    Env::prefixed("CONFERO_").map(|key| {
        let lowered = key.as_str();
        for section in SECTIONS {
            if let Some(rest) = lowered.strip_prefix(&format!("{section}_")) {
                return format!("{section}.{rest}").into();
            }
        }
        lowered.into()
    })
}
