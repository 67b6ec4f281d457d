use serde::Deserialize;

/// Healing period used when autoheal.interval_secs is zero or negative.
pub const DEFAULT_HEAL_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub autoheal: AutoHealConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/vigil.db".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    pub host: String,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            host: "unix:///var/run/docker.sock".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub admin_token: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_token: "vigil-admin-token".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutoHealConfig {
    pub enabled: bool,
    /// Healing pass period. Zero or negative falls back to the default
    /// instead of failing validation.
    pub interval_secs: i64,
    /// Container names exempt from sampling, alerting, and healing.
    pub exclude_containers: Vec<String>,
}

impl Default for AutoHealConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: DEFAULT_HEAL_INTERVAL_SECS as i64,
            exclude_containers: Vec::new(),
        }
    }
}

impl AutoHealConfig {
    pub fn effective_interval_secs(&self) -> u64 {
        if self.interval_secs <= 0 {
            DEFAULT_HEAL_INTERVAL_SECS
        } else {
            self.interval_secs as u64
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub cpu_threshold: f64,
    pub memory_threshold: f64,
    /// Reserved; parsed and validated but consumed by no policy logic yet.
    pub restart_limit: u32,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            cpu_threshold: 90.0,
            memory_threshold: 90.0,
            restart_limit: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub sample_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: 15,
        }
    }
}

impl AppConfig {
    /// Load from CONFIG_FILE (default "config.toml"). A missing file yields
    /// the documented defaults; environment overrides apply either way.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let mut config = match std::fs::read_to_string(&path) {
            Ok(s) => Self::load_from_str(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
            Err(e) => return Err(e.into()),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("VIGIL_ADMIN_TOKEN")
            && !token.is_empty()
        {
            self.auth.admin_token = token;
        }
        if let Ok(path) = std::env::var("VIGIL_DB_PATH")
            && !path.is_empty()
        {
            self.database.path = path;
        }
        if let Ok(host) = std::env::var("DOCKER_HOST")
            && !host.is_empty()
        {
            self.docker.host = host;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(!self.docker.host.is_empty(), "docker.host must be non-empty");
        anyhow::ensure!(
            !self.auth.admin_token.is_empty(),
            "auth.admin_token must be non-empty"
        );
        anyhow::ensure!(
            self.alerts.cpu_threshold > 0.0,
            "alerts.cpu_threshold must be > 0, got {}",
            self.alerts.cpu_threshold
        );
        anyhow::ensure!(
            self.alerts.memory_threshold > 0.0,
            "alerts.memory_threshold must be > 0, got {}",
            self.alerts.memory_threshold
        );
        anyhow::ensure!(
            self.monitoring.sample_interval_secs > 0,
            "monitoring.sample_interval_secs must be > 0, got {}",
            self.monitoring.sample_interval_secs
        );
        Ok(())
    }
}
