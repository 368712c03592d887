use serde::Deserialize;
use std::collections::HashMap;

/// Load a configuration structure from environment variables.
///
/// Nested fields are separated by a double underscore, e.g. `TLS__CA_CERT_PATH`.
pub trait ConfigFromEnv<'de>: Sized + Deserialize<'de> {
    fn from_env() -> Result<Self, config::ConfigError> {
        Self::from(config::Environment::default())
    }

    fn from_env_prefix<S: AsRef<str>>(prefix: S) -> Result<Self, config::ConfigError> {
        Self::from(config::Environment::with_prefix(prefix.as_ref()))
    }

    fn from(env: config::Environment) -> Result<Self, config::ConfigError>;

    /// Load from an explicit set of variables instead of the process environment.
    fn from_set<K, V>(set: HashMap<K, V>) -> Result<Self, config::ConfigError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::from(config::Environment::default().source(Some(into_source(set))))
    }

    /// Like [`ConfigFromEnv::from_set`], only considering variables with the given prefix.
    fn from_set_prefix<S, K, V>(prefix: S, set: HashMap<K, V>) -> Result<Self, config::ConfigError>
    where
        S: AsRef<str>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::from(config::Environment::with_prefix(prefix.as_ref()).source(Some(into_source(set))))
    }
}

fn into_source<K, V>(set: HashMap<K, V>) -> HashMap<String, String>
where
    K: Into<String>,
    V: Into<String>,
{
    set.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

impl<'de, T: Deserialize<'de> + Sized> ConfigFromEnv<'de> for T {
    fn from(env: config::Environment) -> Result<T, config::ConfigError> {
        let env = env.try_parsing(true).separator("__");

        let cfg = config::Config::builder().add_source(env);
        cfg.build()?.try_deserialize()
    }
}
