// src/config.rs

use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};
use tracing::warn;

/// CSV export of the shared spreadsheet backing the dashboard.
pub const SOURCE_URL: &str = "https://docs.google.com/spreadsheets/d/1ZbWkJ8FhX0m3Qe9nLqGAdCMhSVMJ0mHDaNxVZ0zP5sU/export?format=csv&gid=0";

/// Maximum age of a cached table before it is fetched again.
pub const CACHE_TTL: Duration = Duration::from_secs(60);

pub const DEFAULT_PORT: u16 = 8080;

/// Where the HTTP service listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
        }
    }
}

impl ServerConfig {
    /// Read `BIND_ADDR` and `PORT`, keeping the default for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_vars(env::var("BIND_ADDR").ok(), env::var("PORT").ok())
    }

    fn from_vars(bind: Option<String>, port: Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(raw) = bind {
            match raw.parse::<IpAddr>() {
                Ok(ip) => cfg.addr.set_ip(ip),
                Err(_) => warn!(value = %raw, "ignoring unparsable BIND_ADDR"),
            }
        }
        if let Some(raw) = port {
            match raw.parse::<u16>() {
                Ok(p) => cfg.addr.set_port(p),
                Err(_) => warn!(value = %raw, "ignoring unparsable PORT"),
            }
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let cfg = ServerConfig::from_vars(None, None);
        assert_eq!(cfg.addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn reads_bind_and_port() {
        let cfg = ServerConfig::from_vars(Some("127.0.0.1".into()), Some("3000".into()));
        assert_eq!(cfg.addr.to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn bad_values_fall_back() {
        let cfg = ServerConfig::from_vars(Some("localhost:1".into()), Some("eighty".into()));
        assert_eq!(cfg, ServerConfig::default());
    }
}
