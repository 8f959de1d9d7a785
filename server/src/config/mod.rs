use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tokio::{fs::File, io::AsyncReadExt, io::BufReader};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub(crate) struct Configuration {
    pub(crate) listen: SocketAddr,
    /// SQLite file; an in-memory database is used when absent.
    pub(crate) database: Option<PathBuf>,
    pub(crate) static_dir: PathBuf,
    pub(crate) seed_fake_data: bool,
    pub(crate) long_poll_timeout_seconds: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3030)),
            database: None,
            static_dir: PathBuf::from("../app/dist"),
            seed_fake_data: true,
            long_poll_timeout_seconds: 30,
        }
    }
}

impl Configuration {
    pub(crate) async fn from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let config = File::open(path)
            .await
            .with_context(|| format!("when opening {}", path.display()))?;
        let mut config_file = String::new();
        BufReader::new(config)
            .read_to_string(&mut config_file)
            .await
            .context("when reading configuration")?;
        serde_yaml::from_str::<Configuration>(&config_file).context("when parsing configuration")
    }

    pub(crate) fn long_poll_timeout(&self) -> Duration {
        Duration::from_secs(self.long_poll_timeout_seconds)
    }
}
