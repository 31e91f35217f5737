mod config;
mod images;
mod intent;
mod llm;
mod logger;
mod models;
mod ocr;
mod orchestrator;
mod prompts;
mod router;
mod storage;
mod validate;
mod wikipedia;

use std::{sync::Arc, time::Instant};

use anyhow::Context;

use config::load_or_init;
use llm::{KeySource, OpenRouterClient};
use ocr::TesseractOcr;
use orchestrator::Tutor;
use router::{run_router, RouterState};
use storage::SessionStore;
use wikipedia::WikipediaProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let data_dir = config::data_dir();
  std::fs::create_dir_all(&data_dir)
    .with_context(|| format!("creating data dir {}", data_dir.display()))?;
  config::load_env_files(&data_dir);

  let config_path = data_dir.join("config.json");
  let log_path = data_dir.join("studybuddy.log");

  let config = load_or_init(&config_path)?;
  let logger = Arc::new(logger::Logger::new(&log_path)?);
  logger.info("StudyBuddy starting up");

  match config::resolve_api_key() {
    Some(key) if !config::key_format_ok(&key) => {
      logger.warn("OpenRouter key does not start with 'sk-'; model calls will be refused")
    }
    Some(_) => {}
    None => logger.warn("no OpenRouter key found in environment or keyring"),
  }

  let llm = Arc::new(OpenRouterClient::from_config(&config, KeySource::Ambient)?);
  let images = Arc::new(WikipediaProvider::from_config(&config)?);
  let ocr = Arc::new(TesseractOcr::from_config(&config));
  let tutor = Tutor::new(&config, llm, images, ocr, logger.clone());

  let listener = std::net::TcpListener::bind(&config.listen_addr)
    .with_context(|| format!("binding {}", config.listen_addr))?;
  let addr = listener.local_addr()?;
  logger.info(&format!("listening on http://{addr}"));
  eprintln!("StudyBuddy listening on http://{addr} (log: {})", log_path.display());

  let sessions = SessionStore::from_config(&config);
  let state = RouterState {
    started_at: Instant::now(),
    config,
    tutor,
    sessions,
    logger: logger.clone(),
  };
  if let Err(err) = run_router(listener, state).await {
    logger.error(&format!("router error: {err:#}"));
    return Err(err);
  }
  Ok(())
}
