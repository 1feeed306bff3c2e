// SPDX-License-Identifier: PMPL-1.0-or-later

//! Server configuration loaded from YAML or JSON

use crate::prolog::{EngineOptions, UnknownPolicy, DEFAULT_INFERENCE_LIMIT};
use crate::query::driver::DEFAULT_MAX_RESULTS;
use crate::query::QueryLimits;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    /// Clause file consulted at start-up
    pub database: PathBuf,
    pub engine: EngineConfig,
    pub query: QueryConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Inferences one goal may spend across all of its answers
    pub inference_limit: u64,
    pub unknown: UnknownPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// `None` drains every answer
    pub max_results: Option<usize>,
    /// Serve `/query/:goal` with caller-written goals
    pub allow_raw_queries: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: PathBuf::from("data/casefile.pl"),
            engine: EngineConfig::default(),
            query: QueryConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inference_limit: DEFAULT_INFERENCE_LIMIT,
            unknown: UnknownPolicy::Fail,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_results: Some(DEFAULT_MAX_RESULTS),
            allow_raw_queries: true,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("parsing json config {}", path.display())),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("parsing yaml config {}", path.display())),
            _ => Err(anyhow!(
                "unsupported config extension for {} (expected .yaml, .yml or .json)",
                path.display()
            )),
        }
    }

    /// Load `path` when given, otherwise fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            inference_limit: self.engine.inference_limit,
            unknown: self.engine.unknown,
        }
    }

    pub fn query_limits(&self) -> QueryLimits {
        QueryLimits {
            max_results: self.query.max_results,
        }
    }
}
