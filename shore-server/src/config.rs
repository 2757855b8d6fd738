use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    /// "development" exposes internal error messages in API responses
    pub environment: String,
    /// Comma separated list of allowed CORS origins
    pub cors_origins: String,
}

impl Server {
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub path: String,
    pub seed_hotspots: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Auth {
    pub session_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Data {
    pub noaa_base_url: String,
    pub tide_station: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub auth: Auth,
    pub data: Data,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // 1. Try to load from settings.toml (optional for deployment)
        let config_file_name = "settings.toml";

        let current_dir_path = PathBuf::from(config_file_name);
        if current_dir_path.exists() {
            builder = builder.add_source(File::from(current_dir_path).required(false));
        }

        // Check in shore-server directory (for development)
        let dev_path = PathBuf::from("shore-server").join(config_file_name);
        if dev_path.exists() {
            builder = builder.add_source(File::from(dev_path).required(false));
        }

        builder = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.environment", "development")?
            .set_default("server.cors_origins", "http://localhost:5173")?
            .set_default("database.path", "shore.db")?
            .set_default("database.seed_hotspots", true)?
            .set_default("auth.session_days", 7)?
            .set_default(
                "data.noaa_base_url",
                "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter",
            )?
            .set_default("data.tide_station", "8454000")?;

        // 2. Override with environment variables (highest priority)
        let overrides = [
            ("DATABASE_PATH", "database.path"),
            ("PORT", "server.port"),
            ("HOST", "server.host"),
            ("APP_ENV", "server.environment"),
            ("CORS_ORIGINS", "server.cors_origins"),
            ("SESSION_DAYS", "auth.session_days"),
            ("NOAA_API_BASE_URL", "data.noaa_base_url"),
        ];
        for (var, key) in overrides {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        let s = builder.build()?;
        s.try_deserialize()
    }

    /// Settings for tests and tooling: in-memory database, no network upstream
    pub fn for_testing() -> Self {
        Self {
            server: Server {
                host: "127.0.0.1".to_string(),
                port: 0,
                environment: "test".to_string(),
                cors_origins: "http://localhost:5173".to_string(),
            },
            database: Database {
                path: ":memory:".to_string(),
                seed_hotspots: true,
            },
            auth: Auth { session_days: 7 },
            data: Data {
                noaa_base_url: "http://127.0.0.1:9/unreachable".to_string(),
                tide_station: "8454000".to_string(),
            },
        }
    }
}
