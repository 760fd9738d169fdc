use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dj_console_server::config;
use dj_console_server::llm::{build_provider, completion_options};
use dj_console_server::recommendations::RecommendationGenerator;
use dj_console_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};
use dj_console_server::spotify::SpotifyAuth;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the DJ console frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Text-generation backend: openai (any OpenAI-compatible API) or none.
    /// Defaults to openai when an API key is available.
    #[clap(long)]
    pub llm_provider: Option<String>,

    /// Base URL of the text-generation API.
    #[clap(long)]
    pub llm_base_url: Option<String>,

    /// Model used for recommendations.
    #[clap(long)]
    pub llm_model: Option<String>,

    /// API key for the OpenAI-compatible backend.
    #[clap(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Timeout in seconds for a recommendation request to the backend.
    #[clap(long)]
    pub llm_timeout_sec: Option<u64>,

    #[clap(long, env = "SPOTIFY_CLIENT_ID")]
    pub spotify_client_id: Option<String>,

    #[clap(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: Option<String>,

    /// Redirect URI registered with the Spotify application.
    #[clap(long, env = "SPOTIFY_REDIRECT_URI")]
    pub spotify_redirect_uri: Option<String>,

    /// Seed for the recommendation RNG, makes catalog picks reproducible.
    #[clap(long)]
    pub rng_seed: Option<u64>,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            frontend_dir_path: args.frontend_dir_path.clone(),
            llm_provider: args.llm_provider.clone(),
            llm_base_url: args.llm_base_url.clone(),
            llm_model: args.llm_model.clone(),
            llm_api_key: args.llm_api_key.clone(),
            llm_timeout_sec: args.llm_timeout_sec,
            spotify_client_id: args.spotify_client_id.clone(),
            spotify_client_secret: args.spotify_client_secret.clone(),
            spotify_redirect_uri: args.spotify_redirect_uri.clone(),
            rng_seed: args.rng_seed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  port: {}", app_config.port);
    info!("  llm provider: {:?}", app_config.llm.provider);
    info!("  spotify: {}", app_config.spotify.is_some());

    info!("Initializing metrics...");
    metrics::init_metrics();

    let provider = build_provider(&app_config.llm);
    if let Some(provider) = &provider {
        if let Err(err) = provider.health_check().await {
            warn!(
                "LLM provider {} is not reachable, recommendations will fall back to the catalog: {}",
                provider.name(),
                err
            );
        }
    }
    let generator = RecommendationGenerator::new(
        provider,
        completion_options(&app_config.llm),
        app_config.recommendations.max_results,
    );

    let spotify = app_config.spotify.clone().map(SpotifyAuth::new);
    if spotify.is_none() {
        info!("Spotify credentials not configured, OAuth routes are disabled");
    }

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        metrics_port: app_config.metrics_port,
        frontend_dir_path: app_config.frontend_dir_path.clone(),
        rng_seed: app_config.recommendations.rng_seed,
    };

    run_server(server_config, generator, spotify).await
}
