use std::env;

use log::*;
use payment_queue::QueueConfig;
use tpp_common::{helpers::parse_boolean_flag, Secret};

const DEFAULT_TPP_HOST: &str = "127.0.0.1";
const DEFAULT_TPP_PORT: u16 = 3000;
const DEFAULT_DATABASE_URL: &str = "sqlite://ticket_payments.db";
const MIN_WEBHOOK_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Shared secret used by the payment provider to sign webhooks. If it is empty, every webhook is refused.
    pub webhook_secret: Secret<String>,
    /// Run the database migrations at start-up.
    pub auto_migrate: bool,
    pub queue: QueueConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TPP_HOST.to_string(),
            port: DEFAULT_TPP_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            webhook_secret: Secret::default(),
            auto_migrate: true,
            queue: QueueConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TPP_HOST").ok().unwrap_or_else(|| DEFAULT_TPP_HOST.into());
        let port = env::var("TPP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for TPP_PORT. {e} Using the default, {DEFAULT_TPP_PORT}, instead."
                    );
                    DEFAULT_TPP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TPP_PORT);
        let webhook_secret = env::var("TPP_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ TPP_WEBHOOK_SECRET is not set. Every payment webhook will be refused until it is set to the secret \
                 shared with the payment provider."
            );
            String::default()
        });
        if !webhook_secret.is_empty() && webhook_secret.len() < MIN_WEBHOOK_SECRET_LENGTH {
            warn!("🪛️ TPP_WEBHOOK_SECRET is shorter than {MIN_WEBHOOK_SECRET_LENGTH} characters. Use a longer secret.");
        }
        Self {
            host,
            port,
            database_url: database_url_from_env(),
            webhook_secret: Secret::new(webhook_secret),
            auto_migrate: auto_migrate_from_env(),
            queue: QueueConfig::from_env_or_default(),
        }
    }
}

/// Configuration for the `webhook_worker` binary.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub database_url: String,
    pub auto_migrate: bool,
    pub queue: QueueConfig,
}

impl WorkerConfig {
    pub fn from_env_or_default() -> Self {
        Self {
            database_url: database_url_from_env(),
            auto_migrate: auto_migrate_from_env(),
            queue: QueueConfig::from_env_or_default(),
        }
    }
}

fn database_url_from_env() -> String {
    env::var("TPP_DATABASE_URL").ok().unwrap_or_else(|| {
        warn!("🪛️ TPP_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
        DEFAULT_DATABASE_URL.to_string()
    })
}

fn auto_migrate_from_env() -> bool {
    parse_boolean_flag(env::var("TPP_AUTO_MIGRATE").ok(), true)
}

#[cfg(test)]
mod test {
    use payment_queue::QueueMode;

    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::new("0.0.0.0", 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert!(config.webhook_secret.is_empty());
        assert!(config.auto_migrate);
        assert_eq!(config.queue.mode, QueueMode::Durable);
    }
}
