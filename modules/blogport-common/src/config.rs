use std::time::Duration;

use anyhow::{Context, Result};

/// Asset shown as the hero image of posts without usable featured media.
pub const DEFAULT_HERO_ASSET_ID: &str = "Js4bjmLXIjfPArvIiwWdn";

/// Asset substituted for embedded media whose source URL is unreachable.
pub const IMAGE_NOT_FOUND_ASSET_ID: &str = "68qzkHjCboFfCsSxV2v9S6";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Legacy database
    pub database_url: String,

    // Contentful
    pub space_id: String,
    pub environment: String,
    pub locale: String,
    pub management_token: String,
    pub delivery_token: Option<String>,

    // Migration
    pub legacy_site_url: String,
    pub pace: Duration,
    pub default_hero_asset_id: String,
    pub image_not_found_asset_id: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .with_context(|| format!("{key} environment variable is required"))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let pace_ms: u64 = or_default("PACE_MS", "500")
            .parse()
            .context("PACE_MS must be a number of milliseconds")?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            space_id: required("CONTENTFUL_SPACE_ID")?,
            environment: or_default("CONTENTFUL_ENVIRONMENT", "master"),
            locale: or_default("CONTENTFUL_LOCALE", "en-US"),
            management_token: required("CONTENTFUL_MANAGEMENT_ACCESS_TOKEN")?,
            delivery_token: lookup("CONTENTFUL_DELIVERY_ACCESS_TOKEN").filter(|v| !v.is_empty()),
            legacy_site_url: or_default("LEGACY_SITE_URL", "http://www.jobcast.net/"),
            pace: Duration::from_millis(pace_ms),
            default_hero_asset_id: or_default("DEFAULT_HERO_ASSET_ID", DEFAULT_HERO_ASSET_ID),
            image_not_found_asset_id: or_default(
                "IMAGE_NOT_FOUND_ASSET_ID",
                IMAGE_NOT_FOUND_ASSET_ID,
            ),
        })
    }

    fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  CONTENTFUL_SPACE_ID: {}", self.space_id);
        tracing::info!("  CONTENTFUL_ENVIRONMENT: {}", self.environment);
        tracing::info!(
            "  CONTENTFUL_MANAGEMENT_ACCESS_TOKEN: {}",
            preview(&self.management_token)
        );
        tracing::info!(
            "  CONTENTFUL_DELIVERY_ACCESS_TOKEN: {}",
            preview_opt(&self.delivery_token)
        );
        tracing::info!("  PACE_MS: {}", self.pace.as_millis());
    }
}

/// First few characters of a secret and its length.
fn preview(val: &str) -> String {
    let head: String = val.chars().take(5).collect();
    format!("{head}...({} chars)", val.chars().count())
}

fn preview_opt(val: &Option<String>) -> String {
    match val {
        Some(v) if !v.is_empty() => preview(v),
        _ => "<not set>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://localhost/legacy"),
        ("CONTENTFUL_SPACE_ID", "space"),
        ("CONTENTFUL_MANAGEMENT_ACCESS_TOKEN", "CFPAT-secret"),
    ];

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.environment, "master");
        assert_eq!(config.locale, "en-US");
        assert_eq!(config.pace, Duration::from_millis(500));
        assert_eq!(config.default_hero_asset_id, DEFAULT_HERO_ASSET_ID);
        assert_eq!(config.image_not_found_asset_id, IMAGE_NOT_FOUND_ASSET_ID);
        assert_eq!(config.legacy_site_url, "http://www.jobcast.net/");
        assert!(config.delivery_token.is_none());
    }

    #[test]
    fn missing_required_var_names_the_key() {
        let err = Config::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert!(err
            .to_string()
            .contains("CONTENTFUL_MANAGEMENT_ACCESS_TOKEN"));
    }

    #[test]
    fn invalid_pace_is_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PACE_MS", "fast"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn secret_preview_counts_characters_not_bytes() {
        assert_eq!(preview("CFPAT-secret"), "CFPAT...(12 chars)");
        assert_eq!(preview("clé-ünïcødé"), "clé-ü...(11 chars)");
        assert_eq!(preview("ab"), "ab...(2 chars)");
        assert_eq!(preview_opt(&None), "<not set>");
    }
}
