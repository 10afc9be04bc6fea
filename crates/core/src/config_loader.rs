use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

/// Environment prefix and the config section it feeds.
const ENV_SECTIONS: [(&str, &str); 4] = [
    ("SERVER_", "server"),
    ("MYSQL_", "source"),
    ("MONGO_", "sink"),
    ("SYNC_", "sync"),
];

/// Keys taken verbatim from the environment. Credentials like `007` must not become integers.
const TEXT_KEYS: [&str; 6] = ["host", "user", "password", "database", "collection", "uri"];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration, reading TOML overrides from `path` when it exists.
    ///
    /// Environment variables win over the file, the file wins over defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed, a value has the wrong type,
    /// or validation fails.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration (file: {})", path.display());
        let config: AppConfig = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        let figment =
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::file(path));
        ENV_SECTIONS
            .into_iter()
            .fold(figment, |figment, (prefix, section)| {
                merge_env(figment, prefix, section)
            })
    }
}

/// Merges `PREFIX_KEY` variables into `section.key`.
///
/// Typed keys go through figment's value parsing. Text keys are merged as plain strings.
fn merge_env(figment: Figment, prefix: &str, section: &'static str) -> Figment {
    let env = Env::prefixed(prefix).map(move |key| format!("{section}.{key}").into());

    let text_keys: Vec<String> = TEXT_KEYS
        .iter()
        .map(|key| format!("{section}.{key}"))
        .collect();
    let verbatim: Vec<(String, String)> = env
        .iter()
        .map(|(key, value)| (key.as_str().to_ascii_lowercase(), value))
        .filter(|(key, _)| text_keys.contains(key))
        .collect();

    let ignored: Vec<&str> = text_keys.iter().map(String::as_str).collect();
    let figment = figment.merge(env.ignore(&ignored));

    verbatim
        .into_iter()
        .fold(figment, |figment, (key, value)| {
            figment.merge(Serialized::default(&key, value))
        })
}
