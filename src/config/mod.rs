mod file_config;

pub use file_config::{FileConfig, LlmConfig, RecommendationsConfig, SpotifyConfig};

use crate::server::RequestsLoggingLevel;
use crate::spotify::{DEFAULT_AUTHORIZE_URL, DEFAULT_REDIRECT_URI, DEFAULT_SCOPES, DEFAULT_TOKEN_URL};
use anyhow::{bail, Result};
use clap::ValueEnum;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
pub const DEFAULT_MAX_RESULTS: usize = 5;
/// Upper bound for `recommendations.max_results`, responses carry at most this many tracks.
pub const MAX_RESULTS_LIMIT: usize = 5;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub llm_provider: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_timeout_sec: Option<u64>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub spotify_redirect_uri: Option<String>,
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,

    // Feature configs (with defaults)
    pub llm: LlmSettings,
    /// `None` when no client credentials are configured.
    pub spotify: Option<SpotifySettings>,
    pub recommendations: RecommendationSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    /// Any OpenAI-compatible chat completions API.
    OpenAI,
    Disabled,
}

impl LlmProviderKind {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "none" | "disabled" | "" => Some(Self::Disabled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: LlmProviderKind,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::Disabled,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            api_key: None,
            api_key_command: None,
            temperature: 0.7,
            max_tokens: Some(1000),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpotifySettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
}

impl SpotifySettings {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecommendationSettings {
    pub max_results: usize,
    /// Fixed seed for the per-request RNG, for reproducible runs.
    pub rng_seed: Option<u64>,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            rng_seed: None,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let llm = resolve_llm(cli, file.llm.unwrap_or_default())?;
        let spotify = resolve_spotify(cli, file.spotify.unwrap_or_default())?;

        let rec_file = file.recommendations.unwrap_or_default();
        let recommendations = RecommendationSettings {
            max_results: rec_file.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
            rng_seed: rec_file.rng_seed.or(cli.rng_seed),
        };
        if recommendations.max_results == 0 || recommendations.max_results > MAX_RESULTS_LIMIT {
            bail!(
                "recommendations.max_results must be between 1 and {}, got {}",
                MAX_RESULTS_LIMIT,
                recommendations.max_results
            );
        }

        Ok(Self {
            port,
            metrics_port,
            logging_level,
            frontend_dir_path,
            llm,
            spotify,
            recommendations,
        })
    }
}

fn resolve_llm(cli: &CliConfig, llm_file: LlmConfig) -> Result<LlmSettings> {
    let api_key = llm_file.api_key.or_else(|| cli.llm_api_key.clone());
    let api_key_command = llm_file.api_key_command;

    let provider = match llm_file.provider.or_else(|| cli.llm_provider.clone()) {
        Some(name) => match LlmProviderKind::parse(&name) {
            Some(kind) => kind,
            None => bail!(
                "Unknown LLM provider '{}', expected one of: openai, none",
                name
            ),
        },
        // A key alone is enough to turn on the hosted provider
        None if api_key.is_some() || api_key_command.is_some() => LlmProviderKind::OpenAI,
        None => LlmProviderKind::Disabled,
    };

    let defaults = LlmSettings::default();
    let timeout_secs = llm_file
        .timeout_secs
        .or(cli.llm_timeout_sec)
        .unwrap_or(defaults.timeout_secs);
    if timeout_secs == 0 {
        bail!("LLM timeout must be greater than 0 seconds");
    }

    Ok(LlmSettings {
        provider,
        base_url: llm_file
            .base_url
            .or_else(|| cli.llm_base_url.clone())
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
        model: llm_file
            .model
            .or_else(|| cli.llm_model.clone())
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        api_key,
        api_key_command,
        temperature: llm_file.temperature.unwrap_or(defaults.temperature),
        max_tokens: llm_file.max_tokens.or(defaults.max_tokens),
        timeout_secs,
    })
}

fn resolve_spotify(cli: &CliConfig, spotify_file: SpotifyConfig) -> Result<Option<SpotifySettings>> {
    let client_id = spotify_file
        .client_id
        .or_else(|| cli.spotify_client_id.clone())
        .filter(|s| !s.is_empty());
    let client_secret = spotify_file
        .client_secret
        .or_else(|| cli.spotify_client_secret.clone())
        .filter(|s| !s.is_empty());

    let (client_id, client_secret) = match (client_id, client_secret) {
        (Some(id), Some(secret)) => (id, secret),
        (None, None) => return Ok(None),
        _ => bail!("Both the Spotify client id and client secret must be provided together"),
    };

    let mut settings = SpotifySettings::new(client_id, client_secret);
    if let Some(redirect_uri) = spotify_file
        .redirect_uri
        .or_else(|| cli.spotify_redirect_uri.clone())
    {
        settings.redirect_uri = redirect_uri;
    }
    if let Some(authorize_url) = spotify_file.authorize_url {
        settings.authorize_url = authorize_url;
    }
    if let Some(token_url) = spotify_file.token_url {
        settings.token_url = token_url;
    }
    if let Some(scopes) = spotify_file.scopes {
        settings.scopes = scopes;
    }
    Ok(Some(settings))
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
