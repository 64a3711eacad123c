//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (nested keys separated by `__`). The result is turned into
//! a typed [`Settings`] once at process start and handed to each component.
//! Also provides a helper to expand `~` and `${VAR}` in configured paths.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::env;
use std::path::PathBuf;

use crate::settings::Settings;

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment, env_name })
    }

    pub fn env_name(&self) -> &str { &self.env_name }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract and validate the full settings tree for the active environment.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to parse configuration: {}", e))?;
        validate_for_env(&settings, &self.env_name)?;
        Ok(settings)
    }
}

pub fn validate_for_env(settings: &Settings, env: &str) -> anyhow::Result<()> {
    let r = &settings.retrieval;
    if r.chunk_size == 0 {
        anyhow::bail!("retrieval.chunk_size must be > 0");
    }
    if r.chunk_overlap >= r.chunk_size {
        anyhow::bail!("retrieval.chunk_overlap ({}) must be smaller than chunk_size ({})", r.chunk_overlap, r.chunk_size);
    }
    if r.top_k == 0 || r.top_k > r.max_top_k {
        anyhow::bail!("retrieval.top_k ({}) must be within 1..={}", r.top_k, r.max_top_k);
    }
    if settings.embedding.dimension == 0 {
        anyhow::bail!("embedding.dimension must be > 0");
    }
    let o = &settings.orchestrator;
    if o.max_attempts == 0 {
        anyhow::bail!("orchestrator.max_attempts must be >= 1");
    }
    if o.tool_timeout_secs == 0 || o.health_timeout_secs == 0 {
        anyhow::bail!("orchestrator timeouts must be non-zero");
    }
    for (name, agent) in [("decision", &settings.agents.decision), ("synthesis", &settings.agents.synthesis)] {
        if agent.timeout_secs == 0 {
            anyhow::bail!("agents.{name}.timeout_secs must be non-zero");
        }
    }
    match env {
        "prod" | "production" => {
            for (name, agent) in [("decision", &settings.agents.decision), ("synthesis", &settings.agents.synthesis)] {
                if agent.resolved_api_key().is_none() {
                    anyhow::bail!("Prod config requires an API key for agents.{name} (set api_key or ${})", agent.api_key_env);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

