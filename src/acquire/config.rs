// src/acquire/config.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, ensure, Context, Result};
use serde::Deserialize;

const ENV_PATH: &str = "MEME_RELAY_CONFIG_PATH";

/// Environment-supplied tuning for the acquisition engine. Supports TOML or
/// JSON files; every field has a production default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Topic handed to topic-aware providers (the subreddit for Reddit).
    pub subreddit: String,
    /// Provider priority order; first match wins.
    pub providers: Vec<String>,
    pub cache_capacity: usize,
    pub low_watermark: usize,
    pub refill_parallelism: usize,
    pub rate_spacing_ms: u64,
    pub fetch_timeout_ms: u64,
    pub refresh_interval_secs: u64,
    /// Optional JSON file replacing the built-in fallback corpus.
    pub corpus_path: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            subreddit: "memes".to_string(),
            providers: vec![
                "Reddit".to_string(),
                "MemeAPI".to_string(),
                "SomeRandomAPI".to_string(),
            ],
            cache_capacity: 20,
            low_watermark: 5,
            refill_parallelism: 5,
            rate_spacing_ms: 2000,
            fetch_timeout_ms: 10_000,
            refresh_interval_secs: 300,
            corpus_path: None,
        }
    }
}

impl RelayConfig {
    /// Load from an explicit path. The extension is only a hint; both formats
    /// are attempted.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading relay config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, ext.as_str())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $MEME_RELAY_CONFIG_PATH
    /// 2) config/meme_relay.toml
    /// 3) config/meme_relay.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!("MEME_RELAY_CONFIG_PATH points to non-existent path"));
            }
        }
        let toml_p = PathBuf::from("config/meme_relay.toml");
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        let json_p = PathBuf::from("config/meme_relay.json");
        if json_p.exists() {
            return Self::load_from(&json_p);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.cache_capacity >= 1, "cache_capacity must be at least 1");
        ensure!(
            self.low_watermark < self.cache_capacity,
            "low_watermark must be strictly below cache_capacity"
        );
        ensure!(
            self.refill_parallelism >= 1,
            "refill_parallelism must be at least 1"
        );
        ensure!(!self.providers.is_empty(), "provider list must not be empty");
        Ok(())
    }

    pub fn rate_spacing(&self) -> Duration {
        Duration::from_millis(self.rate_spacing_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<RelayConfig> {
    // Try TOML first if hinted or the content doesn't open a JSON object.
    let try_toml = hint_ext == "toml" || !s.trim_start().starts_with('{');
    if try_toml {
        if let Ok(v) = toml::from_str(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = serde_json::from_str(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = toml::from_str(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported relay config format"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn defaults_are_valid() {
        let cfg = RelayConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.cache_capacity, 20);
        assert_eq!(cfg.low_watermark, 5);
        assert_eq!(cfg.providers[0], "Reddit");
    }

    #[test]
    fn toml_and_json_both_parse() {
        let toml = r#"
            subreddit = "programmerhumor"
            cache_capacity = 10
            low_watermark = 2
        "#;
        let cfg = parse_config(toml, "toml").unwrap();
        assert_eq!(cfg.subreddit, "programmerhumor");
        assert_eq!(cfg.cache_capacity, 10);
        assert_eq!(cfg.low_watermark, 2);

        let json = r#"{"rate_spacing_ms": 500, "providers": ["MemeAPI"]}"#;
        let cfg = parse_config(json, "json").unwrap();
        assert_eq!(cfg.rate_spacing_ms, 500);
        assert_eq!(cfg.providers, vec!["MemeAPI".to_string()]);
    }

    #[test]
    fn watermark_at_capacity_is_rejected() {
        let cfg = RelayConfig {
            cache_capacity: 5,
            low_watermark: 5,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD in a temp dir so a real config/ in the repo can't interfere
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_PATH);

        // No files in temp CWD -> defaults
        let v = RelayConfig::load_default().unwrap();
        assert_eq!(v, RelayConfig::default());

        // Env takes precedence
        let p_json = tmp.path().join("relay.json");
        fs::write(&p_json, r#"{"subreddit": "dankmemes", "low_watermark": 3}"#).unwrap();
        env::set_var(ENV_PATH, p_json.display().to_string());
        let v2 = RelayConfig::load_default().unwrap();
        assert_eq!(v2.subreddit, "dankmemes");
        assert_eq!(v2.low_watermark, 3);
        env::remove_var(ENV_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
