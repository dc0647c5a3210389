//! Runtime configuration sourced from the environment.

use std::env;

/// Address the HTTP server binds when `BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Media root used when `MEDIA_ROOT` is unset.
pub const DEFAULT_MEDIA_ROOT: &str = "media";

/// Server settings read once at startup.
///
/// `DATABASE_URL` is optional: without it the server runs against the
/// in-memory store, which suits local development and demos but keeps no
/// data across restarts.
#[derive(Debug, Clone)]
pub struct AppConfig {
    bind_addr: String,
    database_url: Option<String>,
    media_root: String,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned()),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            media_root: lookup("MEDIA_ROOT").unwrap_or_else(|| DEFAULT_MEDIA_ROOT.to_owned()),
        }
    }

    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    pub fn media_root(&self) -> &str {
        &self.media_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        AppConfig::from_lookup(|name| vars.get(name).map(|value| (*value).to_owned()))
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.bind_addr(), DEFAULT_BIND_ADDR);
        assert_eq!(config.database_url(), None);
        assert_eq!(config.media_root(), DEFAULT_MEDIA_ROOT);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = config_from(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("DATABASE_URL", "postgres://localhost/recipes"),
            ("MEDIA_ROOT", "/srv/media"),
        ]);
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.database_url(), Some("postgres://localhost/recipes"));
        assert_eq!(config.media_root(), "/srv/media");
    }

    #[test]
    fn empty_database_url_counts_as_unset() {
        let config = config_from(&[("DATABASE_URL", "")]);
        assert_eq!(config.database_url(), None);
    }
}
