use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::{env, fmt::Display, str::FromStr, time::Duration};

use crate::scan::LedgerClock;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_scan_per_min: u32,
    pub rate_admission_per_min: u32,
    pub rate_lookup_per_min: u32,

    // Student cache used by the scanner
    pub student_cache_capacity: u64,
    pub student_cache_ttl: Duration,
    pub cache_warmup_days: u32,
    pub cache_warmup_batch: usize,

    // Calendar the attendance day follows: utc | local
    pub ledger_clock: LedgerClock,

    pub run_migrations: bool,
    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: required("DATABASE_URL")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            rate_scan_per_min: parse_or("RATE_SCAN_PER_MIN", 120)?,
            rate_admission_per_min: parse_or("RATE_ADMISSION_PER_MIN", 30)?,
            rate_lookup_per_min: parse_or("RATE_LOOKUP_PER_MIN", 60)?,

            student_cache_capacity: parse_or("STUDENT_CACHE_CAPACITY", 50_000)?,
            student_cache_ttl: Duration::from_secs(parse_or("STUDENT_CACHE_TTL_SECS", 900)?),
            cache_warmup_days: parse_or("CACHE_WARMUP_DAYS", 365)?,
            cache_warmup_batch: parse_or("CACHE_WARMUP_BATCH", 250)?,

            ledger_clock: parse_or("LEDGER_TZ", LedgerClock::Utc)?,

            run_migrations: parse_or("RUN_MIGRATIONS", true)?,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: parse_or("LOG_LEVEL", tracing::Level::DEBUG)?,
        })
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key} value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}
