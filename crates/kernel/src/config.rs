//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Origins allowed when `CORS_ALLOWED_ORIGINS` is unset.
pub const DEFAULT_CORS_ORIGINS: [&str; 2] =
    ["https://strapi-blog-steel.vercel.app", "http://localhost:3000"];

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 1337).
    pub port: u16,

    /// PostgreSQL connection URL. When None, content lives in memory.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Redis connection URL. When set, server-side sessions are enabled.
    pub redis_url: Option<String>,

    /// CORS allowed origins (comma-separated, "*" for any).
    pub cors_allowed_origins: Vec<String>,

    /// Cookie SameSite policy: "strict", "lax", or "none" (default: "strict").
    pub cookie_same_site: String,

    /// Bearer token granting full API access. When None, only public
    /// permissions apply.
    pub admin_api_token: Option<String>,

    /// Directory served for paths no route matches (default: ./public).
    pub public_dir: PathBuf,

    /// Maximum request body size in bytes (default: 1 MiB).
    pub max_body_bytes: usize,

    /// Seed file replacing the built-in seed lists.
    pub seed_file: Option<PathBuf>,

    /// Skip the first-boot bootstrap on `serve`.
    pub skip_bootstrap: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "1337".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url = non_empty_var("DATABASE_URL");

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let redis_url = non_empty_var("REDIS_URL");

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect());

        let cookie_same_site = env::var("COOKIE_SAME_SITE")
            .unwrap_or_else(|_| "strict".to_string())
            .to_lowercase();

        let admin_api_token = non_empty_var("ADMIN_API_TOKEN");

        let public_dir = env::var("PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./public"));

        let max_body_bytes = env::var("MAX_BODY_BYTES")
            .unwrap_or_else(|_| (1024 * 1024).to_string())
            .parse()
            .context("MAX_BODY_BYTES must be a valid usize")?;

        let seed_file = non_empty_var("SEED_FILE").map(PathBuf::from);

        let skip_bootstrap = env::var("SKIP_BOOTSTRAP")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            redis_url,
            cors_allowed_origins,
            cookie_same_site,
            admin_api_token,
            public_dir,
            max_body_bytes,
            seed_file,
            skip_bootstrap,
        })
    }
}

impl Default for Config {
    /// In-memory configuration with no sessions and no admin token.
    fn default() -> Self {
        Self {
            port: 1337,
            database_url: None,
            database_max_connections: 10,
            redis_url: None,
            cors_allowed_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            cookie_same_site: "strict".to_string(),
            admin_api_token: None,
            public_dir: PathBuf::from("./public"),
            max_body_bytes: 1024 * 1024,
            seed_file: None,
            skip_bootstrap: false,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Split a comma-separated origin list, dropping blanks and trailing slashes.
pub fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed() {
        assert_eq!(
            parse_origins(" https://example.com/ , http://localhost:3000,,"),
            vec!["https://example.com", "http://localhost:3000"]
        );
    }

    #[test]
    fn flags_accept_common_spellings() {
        for v in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(parse_flag(v), "{v}");
        }
        for v in ["0", "false", "", "nope"] {
            assert!(!parse_flag(v), "{v}");
        }
    }

    #[test]
    fn defaults_use_memory_store() {
        let config = Config::default();
        assert!(config.database_url.is_none());
        assert_eq!(config.port, 1337);
        assert_eq!(config.cors_allowed_origins.len(), 2);
    }
}
