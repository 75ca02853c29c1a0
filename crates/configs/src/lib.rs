use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_WORKER_THREADS: usize = 4;
pub const DEFAULT_LEDGER_FILE: &str = "transactions.json";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { DEFAULT_PORT }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: DEFAULT_PORT, worker_threads: Some(DEFAULT_WORKER_THREADS) }
    }
}

/// Where the ledger lives. `data_dir` defaults to the working directory,
/// which the container image sets to `/data`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

fn default_data_dir() -> PathBuf { PathBuf::from(".") }
fn default_file_name() -> String { DEFAULT_LEDGER_FILE.into() }

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir(), file_name: default_file_name() }
    }
}

impl StorageConfig {
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }
}

/// Path of the TOML file: `CONFIG_PATH` or `config.toml`.
pub fn config_path() -> PathBuf {
    std::env::var("CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"))
}

pub fn load_from_file(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// File (if present) → environment overrides → normalize/validate.
    ///
    /// A missing config file is not an error: the service must start with no
    /// arguments and no environment. A present but malformed file is.
    pub fn load_and_validate() -> Result<Self> {
        let path = config_path();
        let mut cfg = if path.exists() { load_from_file(&path)? } else { AppConfig::default() };
        cfg.apply_env_overrides_with(|k| std::env::var(k).ok())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Apply `SERVER_HOST`, `SERVER_PORT`, `TOKIO_WORKER_THREADS`, `DATA_DIR`
    /// and `LEDGER_FILE` from the given lookup.
    pub fn apply_env_overrides_with<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = get("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("SERVER_PORT") {
            self.server.port = port
                .trim()
                .parse::<u16>()
                .map_err(|_| anyhow!("SERVER_PORT 无效: {port}"))?;
        }
        if let Some(w) = get("TOKIO_WORKER_THREADS") {
            self.server.worker_threads = Some(
                w.trim()
                    .parse::<usize>()
                    .map_err(|_| anyhow!("TOKIO_WORKER_THREADS 无效: {w}"))?,
            );
        }
        if let Some(dir) = get("DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(name) = get("LEDGER_FILE") {
            self.storage.file_name = name;
        }
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server
        self.server.normalize()?;
        self.storage.validate()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port 必须在 1..=65535 范围内"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(DEFAULT_WORKER_THREADS),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(anyhow!("storage.data_dir 不能为空"));
        }
        let name = self.file_name.trim();
        if name.is_empty() {
            return Err(anyhow!("storage.file_name 不能为空"));
        }
        // 文件名只能是单个路径组件，不能逃出 data_dir
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(anyhow!("storage.file_name 必须是不含路径分隔符的文件名"));
        }
        Ok(())
    }
}
