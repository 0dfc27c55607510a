use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub classifier_url: String,
    pub pinning_url: String,
    pub pinning_jwt: String,
    pub rpc_url: String,
    pub contract_address: String,
    pub documents_url: String,
    pub documents_token: Option<String>,
    pub collection: String,
    pub http_timeout: Duration,
    pub signing_timeout: Duration,
    pub confirmation_timeout: Duration,
    pub receipt_poll_interval: Duration,
    pub log_level: String,
}

impl Config {
    /// Load `.env` if present, then read the environment.
    pub fn load() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, String> {
        let classifier_url = trim_base(env_or("MEDIBLOCK_CLASSIFIER_URL", "http://127.0.0.1:5000"));
        let pinning_url = trim_base(env_or("MEDIBLOCK_PINNING_URL", "https://api.pinata.cloud"));
        let pinning_jwt = env_required("MEDIBLOCK_PINNING_JWT")?;
        let rpc_url = env_or("MEDIBLOCK_RPC_URL", "http://127.0.0.1:8545");

        let contract_address = env_required("MEDIBLOCK_CONTRACT_ADDRESS")?;
        if !is_address(&contract_address) {
            return Err(format!(
                "Invalid MEDIBLOCK_CONTRACT_ADDRESS: expected 0x followed by 40 hex digits, got '{contract_address}'"
            ));
        }

        let documents_url = trim_base(env_required("MEDIBLOCK_DOCUMENTS_URL")?);
        let documents_token = std::env::var("MEDIBLOCK_DOCUMENTS_TOKEN")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let collection = env_or("MEDIBLOCK_COLLECTION", "complaints");

        let http_timeout = Duration::from_secs(env_parse("MEDIBLOCK_HTTP_TIMEOUT_SECS", "30")?);
        let signing_timeout = Duration::from_secs(env_parse("MEDIBLOCK_SIGNING_TIMEOUT_SECS", "300")?);
        let confirmation_timeout =
            Duration::from_secs(env_parse("MEDIBLOCK_CONFIRMATION_TIMEOUT_SECS", "120")?);
        let receipt_poll_interval =
            Duration::from_millis(env_parse("MEDIBLOCK_RECEIPT_POLL_MS", "2000")?);

        if confirmation_timeout.is_zero() {
            return Err("MEDIBLOCK_CONFIRMATION_TIMEOUT_SECS must be greater than zero".to_string());
        }

        let log_level = env_or("MEDIBLOCK_LOG_LEVEL", "info");

        Ok(Config {
            classifier_url,
            pinning_url,
            pinning_jwt,
            rpc_url,
            contract_address,
            documents_url,
            documents_token,
            collection,
            http_timeout,
            signing_timeout,
            confirmation_timeout,
            receipt_poll_interval,
            log_level,
        })
    }
}

pub(crate) fn is_address(s: &str) -> bool {
    s.len() == 42
        && s.starts_with("0x")
        && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse(key: &str, default: &str) -> Result<u64, String> {
    env_or(key, default)
        .parse()
        .map_err(|e| format!("Invalid {key}: {e}"))
}
