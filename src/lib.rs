mod commands;
pub mod config;
pub mod error;
pub mod gemini;
pub mod media;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod service;
pub mod state;
pub mod storage;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::StudioConfig;
use error::{AppError, AppResult};
use gemini::{GeminiClient, GeminiConfig};
use state::StudioSession;

pub struct AppState {
    pub gemini: GeminiClient,
    pub config: StudioConfig,
    pub session: StudioSession,
}

pub fn run() -> AppResult<()> {
    config::load_env_files();
    init_tracing();

    let cli = commands::Cli::parse();
    let mut app_state = AppState {
        gemini: GeminiClient::new(GeminiConfig::from_env()),
        config: StudioConfig::from_env(),
        session: StudioSession::default(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime
        .block_on(commands::dispatch(cli, &mut app_state))
        .map_err(AppError::Message)
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "genova_studio_lib=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
