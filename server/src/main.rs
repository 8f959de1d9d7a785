use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use business::EventStore;
use config::Configuration;
use data::DatabaseApi;
use rest::serve_rest_endpoint;

mod business;
mod config;
mod data;
mod rest;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration; built-in defaults are used when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Args {
    async fn get_config_file(&self) -> anyhow::Result<Configuration> {
        match &self.config {
            Some(path) => Configuration::from_file(path).await,
            None => Ok(Configuration::default()),
        }
    }
}

fn open_database(config: &Configuration) -> anyhow::Result<DatabaseApi> {
    let database = match &config.database {
        Some(path) => DatabaseApi::open(path)?,
        None => DatabaseApi::new_temporary()?,
    };
    database
        .init_database()
        .context("when initializing database")?;
    // only an empty database gets samples, a persistent file is seeded once
    if config.seed_fake_data && database.newest_id()? == -1 {
        database
            .add_fake_data()
            .context("when inserting fake data")?;
    }
    Ok(database)
}

#[tokio::main(worker_threads = 2)]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.get_config_file().await?;
    let database = open_database(&config)?;
    let store = EventStore::new(database, config.long_poll_timeout())?;

    serve_rest_endpoint(store, &config).await
}
