use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Gemini API key
    pub gemini_api_key: String,

    /// Image generation model
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Provider API base URL (overridable to point at a stub)
    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,

    /// Upper bound on a single provider call, in seconds
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,

    /// How often the reclamation sweep runs, in seconds
    #[serde(default = "default_reclaim_interval_secs")]
    pub reclaim_interval_secs: u64,

    /// Age past which jobs and batches are evicted, in seconds
    #[serde(default = "default_job_retention_secs")]
    pub job_retention_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_generation_timeout_secs() -> u64 {
    120
}

fn default_reclaim_interval_secs() -> u64 {
    900 // 15 minutes
}

fn default_job_retention_secs() -> u64 {
    3600 // 1 hour
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
