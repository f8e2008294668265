// Runtime settings. Defaults mirror the upload form (50 MB limit, top 10
// products); each one can be overridden from the environment.
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

pub const ENV_STORE_PATH: &str = "DIGIPINE_STORE_PATH";
pub const ENV_OUTPUT_DIR: &str = "DIGIPINE_OUTPUT_DIR";
pub const ENV_TOP_PRODUCTS: &str = "DIGIPINE_TOP_PRODUCTS";
pub const ENV_MAX_UPLOAD_MB: &str = "DIGIPINE_MAX_UPLOAD_MB";

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON file backing the key/value store shared across sessions.
    pub store_path: PathBuf,
    /// Directory that receives exported CSV tables and the JSON envelope.
    pub output_dir: PathBuf,
    pub top_products: usize,
    pub max_upload_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store_path: PathBuf::from("digipine_store.json"),
            output_dir: PathBuf::from("."),
            top_products: 10,
            max_upload_bytes: 50 * BYTES_PER_MB,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Unparseable values are logged and
    /// fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();
        if let Some(p) = lookup(ENV_STORE_PATH).filter(|s| !s.trim().is_empty()) {
            cfg.store_path = PathBuf::from(p);
        }
        if let Some(p) = lookup(ENV_OUTPUT_DIR).filter(|s| !s.trim().is_empty()) {
            cfg.output_dir = PathBuf::from(p);
        }
        if let Some(n) = parse_var::<usize>(&lookup, ENV_TOP_PRODUCTS) {
            cfg.top_products = n;
        }
        if let Some(mb) = parse_var::<u64>(&lookup, ENV_MAX_UPLOAD_MB) {
            cfg.max_upload_bytes = mb.saturating_mul(BYTES_PER_MB);
        }
        cfg
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring invalid setting");
            None
        }
    }
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
    fn defaults_without_overrides() {
        let cfg = Config::from_lookup(lookup(&[]));
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.max_upload_bytes, 52_428_800);
        assert_eq!(cfg.top_products, 10);
    }

    #[test]
    fn overrides_apply() {
        let cfg = Config::from_lookup(lookup(&[
            (ENV_STORE_PATH, "/tmp/kv.json"),
            (ENV_OUTPUT_DIR, "out"),
            (ENV_TOP_PRODUCTS, "5"),
            (ENV_MAX_UPLOAD_MB, "2"),
        ]));
        assert_eq!(cfg.store_path, PathBuf::from("/tmp/kv.json"));
        assert_eq!(cfg.output_dir, PathBuf::from("out"));
        assert_eq!(cfg.top_products, 5);
        assert_eq!(cfg.max_upload_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn invalid_numbers_keep_defaults() {
        let cfg = Config::from_lookup(lookup(&[(ENV_TOP_PRODUCTS, "ten")]));
        assert_eq!(cfg.top_products, 10);
    }
}
