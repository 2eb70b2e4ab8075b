// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! `./dunning.toml` > `~/.config/dunning/dunning.toml` > `/etc/dunning/dunning.toml`,
//! with `DUNNING_` environment variables on top.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DunningConfig;

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/dunning/dunning.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "dunning.toml";

/// Sections that `DUNNING_<SECTION>_<KEY>` variables map into.
const ENV_SECTIONS: &[&str] = &["logging", "storage", "scheduler", "transport", "templates"];

/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/dunning/dunning.toml`
/// 3. `~/.config/dunning/dunning.toml`
/// 4. `./dunning.toml`
/// 5. `DUNNING_*` environment variables
pub fn load_config() -> Result<DunningConfig, figment::Error> {
    build_figment().extract()
}

/// Load from a TOML string over the compiled defaults. No files, no env.
pub fn load_config_from_str(toml_content: &str) -> Result<DunningConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DunningConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DunningConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DunningConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full hierarchy before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DunningConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

pub(crate) fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("dunning/dunning.toml"))
}

/// `DUNNING_TRANSPORT_AUTH_TOKEN` must land on `transport.auth_token`, so the
/// section is split off explicitly instead of splitting on every underscore.
fn env_provider() -> Env {
    Env::prefixed("DUNNING_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
