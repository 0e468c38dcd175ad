//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    // Site
    pub title: String,
    pub description: String,

    // Directory
    pub posts_dir: String,
    pub data_dir: String,
    pub stats_file: String,
    pub public_dir: String,

    // Writing
    pub excerpt_length: usize,
    pub read_speed: usize,

    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            title: "Markpress".to_string(),
            description: String::new(),

            posts_dir: "_posts".to_string(),
            data_dir: "data".to_string(),
            stats_file: "stats.json".to_string(),
            public_dir: "public".to_string(),

            excerpt_length: 150,
            read_speed: 300,

            server: ServerConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl BlogConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: BlogConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `SESSION_SECRET` / `ADMIN_PASSWORD` from the environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("SESSION_SECRET").ok(),
            std::env::var("ADMIN_PASSWORD").ok(),
        );
    }

    fn apply_overrides(&mut self, secret: Option<String>, password: Option<String>) {
        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            self.auth.secret = secret;
        }
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            self.auth.admin_password = Some(password);
        }
    }

    /// Stats document file stem, e.g. `stats` for `stats.json`
    pub fn stats_key(&self) -> &str {
        self.stats_file
            .strip_suffix(".json")
            .unwrap_or(&self.stats_file)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "localhost".to_string(),
            port: 3000,
        }
    }
}

/// Admin session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub session_hours: i64,
    pub secure_cookie: bool,
    pub secret: String,
    /// Login is disabled while no password is configured
    pub admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "admin-token".to_string(),
            session_hours: 24,
            secure_cookie: false,
            secret: "fallback-secret".to_string(),
            admin_password: None,
        }
    }
}
