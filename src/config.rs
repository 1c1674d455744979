use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub api_prefix: String,
    pub log_dir: String,

    // Rate limiting
    pub rate_leave_per_min: u32,

    // Employee directory cache
    pub directory_cache_ttl_secs: u64,
    pub directory_warmup_batch: usize,

    /// Principal approval of OD leave also accrues into the ledger
    pub accrue_od_leave: bool,
}

/// Reads `key`, falling back to `default` when unset. A set but unparsable
/// value is an error naming the key.
fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            rate_leave_per_min: env_or("RATE_LEAVE_PER_MIN", 600)?,

            directory_cache_ttl_secs: env_or("DIRECTORY_CACHE_TTL_SECS", 600)?,
            directory_warmup_batch: env_or("DIRECTORY_WARMUP_BATCH", 250)?,

            accrue_od_leave: env_or("ACCRUE_OD_LEAVE", false)?,
        })
    }
}
