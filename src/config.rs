use anyhow::{Context, Result};

const DEFAULT_TABLE: &str = "job_applications";
const DEFAULT_LOG_FILE: &str = "momentum.log";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration loaded from environment variables.
/// Startup fails if the store URL or key is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub owner_id: Option<String>,
    pub table: String,
    pub log_file: String,
    pub rust_log: String,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            supabase_url: require(&lookup, "SUPABASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            supabase_anon_key: require(&lookup, "SUPABASE_ANON_KEY")?,
            owner_id: optional("MOMENTUM_OWNER_ID"),
            table: optional("MOMENTUM_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            log_file: optional("MOMENTUM_LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            http_timeout_secs: match optional("MOMENTUM_HTTP_TIMEOUT_SECS") {
                Some(raw) => raw
                    .parse::<u64>()
                    .context("MOMENTUM_HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
                None => DEFAULT_HTTP_TIMEOUT_SECS,
            },
        })
    }
}

fn require(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_required_endpoints_and_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap();
        assert_eq!(config.supabase_url, "https://demo.supabase.co");
        assert_eq!(config.supabase_anon_key, "anon");
        assert_eq!(config.table, "job_applications");
        assert_eq!(config.log_file, "momentum.log");
        assert_eq!(config.http_timeout_secs, 30);
        assert!(config.owner_id.is_none());
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let err = Config::from_lookup(lookup(&[("SUPABASE_URL", "https://demo.supabase.co")]))
            .unwrap_err();
        assert!(err.to_string().contains("SUPABASE_ANON_KEY"));
    }

    #[test]
    fn test_blank_url_counts_as_missing() {
        let err = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "  "),
            ("SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SUPABASE_URL"));
    }

    #[test]
    fn test_bad_timeout_is_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("MOMENTUM_HTTP_TIMEOUT_SECS", "soon"),
        ]));
        assert!(result.is_err());
    }
}
