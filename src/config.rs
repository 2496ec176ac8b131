use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    /// Directory holding `preprocessor.json` and `model.json`.
    pub model_dir: PathBuf,
    pub ssl_timeout_secs: u64,
    /// WHOIS referral server queried for the TLD's registry server.
    pub whois_referral_server: String,
    /// Base URL of the remote artifact store; artifacts are pulled at
    /// startup when set.
    pub store_url: Option<String>,
    /// Remote prefix the model artifacts live under.
    pub store_model_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("PHISHGUARD_BIND")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            model_dir: std::env::var("PHISHGUARD_MODEL_DIR")
                .unwrap_or_else(|_| "./final_model".to_string())
                .into(),
            ssl_timeout_secs: std::env::var("PHISHGUARD_SSL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            whois_referral_server: std::env::var("PHISHGUARD_WHOIS_SERVER")
                .unwrap_or_else(|_| "whois.iana.org:43".to_string()),
            store_url: std::env::var("PHISHGUARD_STORE_URL").ok(),
            store_model_prefix: std::env::var("PHISHGUARD_STORE_MODEL_PREFIX")
                .unwrap_or_else(|_| "final_model".to_string()),
        }
    }
}
