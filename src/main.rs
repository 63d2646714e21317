use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use teloxide::Bot;
use tracing::{error, info, warn};

use voiq_bot::{import_file, logging, telegram, BotError, Config, Controller, QuizEngine, SqliteStore};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    logging::init_tracing(&config.log_level);

    info!("bot starting");
    let store = match open_store(&config) {
        Ok(store) => store,
        Err(err) => {
            error!(error = %err, "startup failed");
            return ExitCode::FAILURE;
        }
    };
    info!(path = %config.database_path.display(), "database connection verified");

    if let Some(path) = &config.base_vocabulary_file {
        if let Err(err) = import_file(&store, path) {
            warn!(path = %path.display(), error = %err, "base vocabulary import skipped");
        }
    }
    match store.count_base_words() {
        Ok(0) => warn!("base vocabulary is empty, rounds will only use personal words"),
        Ok(count) => info!(count, "base vocabulary loaded"),
        Err(err) => warn!(error = %err, "could not count base vocabulary"),
    }

    let controller = Arc::new(Mutex::new(Controller::new(QuizEngine::new(store))));
    telegram::run(Bot::new(config.bot_token), controller).await;

    info!("bot stopped");
    ExitCode::SUCCESS
}

fn open_store(config: &Config) -> Result<SqliteStore, BotError> {
    let store = SqliteStore::open(&config.database_path)?;
    store.init_schema()?;
    store.verify_schema()?;
    Ok(store)
}
