use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Costs bcrypt accepts; anything else makes every hash fail.
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// Extra room on top of `max_paste_size` for the JSON envelope of a request.
pub const BODY_LIMIT_HEADROOM: usize = 64 * 1024;

/// Server configuration, read from the environment with defaults for local use.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file. Env: `DB_PATH`
    pub db_path: String,
    /// Env: `BIND`
    pub host: IpAddr,
    /// Env: `PORT`
    pub port: u16,
    /// Lifetime of issued bearer tokens. Env: `TOKEN_TTL_HOURS`
    pub token_ttl_hours: i64,
    /// Env: `BCRYPT_COST`
    pub bcrypt_cost: u32,
    /// Largest accepted paste content in bytes. Env: `MAX_PASTE_SIZE`
    pub max_paste_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "notesaver.db".to_string(),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            token_ttl_hours: 24 * 30,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            max_paste_size: 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: env::var("DB_PATH").unwrap_or(defaults.db_path),
            host: parsed_var("BIND").unwrap_or(defaults.host),
            port: parsed_var("PORT").unwrap_or(defaults.port),
            token_ttl_hours: parsed_var("TOKEN_TTL_HOURS").unwrap_or(defaults.token_ttl_hours),
            bcrypt_cost: checked_bcrypt_cost(parsed_var("BCRYPT_COST")),
            max_paste_size: parsed_var("MAX_PASTE_SIZE").unwrap_or(defaults.max_paste_size),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Largest request body the router accepts.
    pub fn body_limit(&self) -> usize {
        self.max_paste_size.saturating_add(BODY_LIMIT_HEADROOM)
    }
}

fn checked_bcrypt_cost(cost: Option<u32>) -> u32 {
    cost.filter(|cost| BCRYPT_COST_RANGE.contains(cost))
        .unwrap_or(bcrypt::DEFAULT_COST)
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}
