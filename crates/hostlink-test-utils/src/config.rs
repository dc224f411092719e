//! Configuration builders and temp-file fixtures for tests.

use std::path::{Path, PathBuf};

use hostlink_config::AppConfig;
use tempfile::TempDir;

/// Fluent builder for [`AppConfig`] in tests.
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .host_port(mock.port())
///     .framing("text")
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn host_addr(mut self, addr: &str) -> Self {
        self.config.host.addr = addr.to_string();
        self
    }

    pub fn host_port(mut self, port: u16) -> Self {
        self.config.host.port = port;
        self
    }

    pub fn framing(mut self, framing: &str) -> Self {
        self.config.host.framing = framing.to_string();
        self
    }

    pub fn reassembly(mut self, strategy: &str) -> Self {
        self.config.host.reassembly = strategy.to_string();
        self
    }

    /// Connect, response, and chunk timeouts in milliseconds.
    pub fn timeouts_ms(mut self, connect: u64, response: u64, chunk: u64) -> Self {
        self.config.host.connect_timeout_ms = connect;
        self.config.host.response_timeout_ms = response;
        self.config.host.chunk_timeout_ms = chunk;
        self
    }

    pub fn catalogue_path(mut self, path: &Path) -> Self {
        self.config.catalogue.path = Some(path.display().to_string());
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A catalogue document in an owned temp directory.
///
/// The directory is removed when this value is dropped, even on panic.
pub struct TempCatalogue {
    pub path: PathBuf,
    _temp_dir: TempDir,
}

impl TempCatalogue {
    pub async fn with_json(json: &str) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let path = temp_dir.path().join("prompts.json");
        let catalogue = Self {
            path,
            _temp_dir: temp_dir,
        };
        catalogue.write(json).await;
        catalogue
    }

    /// Overwrite the document (for reload testing).
    pub async fn write(&self, json: &str) {
        tokio::fs::write(&self.path, json)
            .await
            .expect("failed to write catalogue document");
    }
}
