//! Environment-driven configuration
//!
//! Every knob has a local-run default; provider adapters register only
//! when their key is present.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketSourceKind {
    /// Live public ticker
    Binance,
    /// Fixed in-memory quotes (offline runs)
    Static,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub api_key: String,
    pub price_refresh: Duration,
    pub market_source: MarketSourceKind,
    pub binance_base_url: String,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub deepseek_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = env_or("ARENA_BIND", "0.0.0.0:8080")
            .parse()
            .unwrap_or_else(|_| {
                warn!("unparsable ARENA_BIND; falling back to 0.0.0.0:8080");
                SocketAddr::from(([0, 0, 0, 0], 8080))
            });

        let price_refresh = Duration::from_secs(
            env_or("ARENA_PRICE_REFRESH_SECS", "15").parse().unwrap_or(15),
        );

        let market_source = match env_or("ARENA_MARKET_SOURCE", "binance").as_str() {
            "static" => MarketSourceKind::Static,
            _ => MarketSourceKind::Binance,
        };

        let api_key = env_or("ARENA_API_KEY", "dev-secret");
        if api_key == "dev-secret" {
            warn!("ARENA_API_KEY not set; using the development secret");
        }

        Self {
            bind_addr,
            api_key,
            price_refresh,
            market_source,
            binance_base_url: env_or("ARENA_BINANCE_URL", "https://api.binance.com"),
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            deepseek_api_key: std::env::var("DEEPSEEK_API_KEY").ok(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
