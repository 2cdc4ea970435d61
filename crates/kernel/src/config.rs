//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use crate::menu::RouteListScope;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Redis connection URL for sessions.
    pub redis_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Cookie SameSite policy: "strict", "lax", or "none" (default: "strict").
    pub cookie_same_site: String,

    /// Directory of module catalogs (YAML or JSON). Only the built-in
    /// catalog is registered when unset.
    pub modules_dir: Option<PathBuf>,

    /// Which menu routes the route list lookup offers (default: all).
    pub route_list_scope: RouteListScope,

    /// Per-request timeout in seconds (default: 30).
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let cookie_same_site = env::var("COOKIE_SAME_SITE")
            .unwrap_or_else(|_| "strict".to_string())
            .to_lowercase();

        let modules_dir = env::var("MODULES_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let route_list_scope = env::var("MENU_ROUTE_LIST_SCOPE")
            .unwrap_or_else(|_| "all".to_string())
            .parse::<RouteListScope>()
            .map_err(|e| anyhow!(e))
            .context("MENU_ROUTE_LIST_SCOPE must be 'all' or 'module'")?;

        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("REQUEST_TIMEOUT_SECS must be a valid u64")?;

        Ok(Self {
            port,
            database_url,
            redis_url,
            database_max_connections,
            cookie_same_site,
            modules_dir,
            route_list_scope,
            request_timeout_secs,
        })
    }
}
