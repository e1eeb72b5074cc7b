//! [`Daemon`] construction from throwaway config files.

use std::path::PathBuf;

use switchboard_config::AppConfig;
use switchboard_core::Daemon;
use switchboard_core::daemon::Services;
use tempfile::TempDir;

use crate::config::TestConfigBuilder;

/// A daemon whose config file lives in a temp dir owned by this value.
pub struct TestDaemon {
    pub daemon: Daemon,
    pub config_path: PathBuf,
    _temp_dir: TempDir,
}

impl TestDaemon {
    /// Write `toml_content` to `switchboard.toml` and load it the way the CLI does.
    pub async fn with_toml(toml_content: &str) -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let config_path = temp_dir.path().join("switchboard.toml");
        tokio::fs::write(&config_path, toml_content)
            .await
            .expect("write switchboard.toml");
        let config = AppConfig::load(&config_path)
            .await
            .expect("parse switchboard.toml");

        Self {
            daemon: Daemon::new(config),
            config_path,
            _temp_dir: temp_dir,
        }
    }

    /// Serialize a builder's config to disk first, so the file round-trip is covered too.
    pub async fn with_builder(builder: TestConfigBuilder) -> Self {
        let rendered = toml::to_string(&builder.build()).expect("render config");
        Self::with_toml(&rendered).await
    }

    pub async fn default_config() -> Self {
        Self::with_toml("").await
    }

    /// Wire the engines, registry and agent without binding a listener.
    pub fn services(&self) -> Services {
        self.daemon.build_services()
    }
}
