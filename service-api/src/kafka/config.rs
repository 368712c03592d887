use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, path::PathBuf, str::FromStr};
use thiserror::Error;

/// Environment variables consulted when finalizing a [`KafkaClientConfig`].
pub mod env {
    pub const BROKERS: &str = "KAFKA_BROKERS";
    pub const USERNAME: &str = "KAFKA_USERNAME";
    pub const PASSWORD: &str = "KAFKA_PASSWORD";
    pub const SASL_MECHANISM: &str = "KAFKA_SASL_MECHANISM";
    pub const PLAINTEXT: &str = "KAFKA_PLAINTEXT";
    pub const TLS_INSECURE: &str = "KAFKA_TLS_INSECURE";
    pub const TLS_CA_CERT_PATH: &str = "KAFKA_TLS_CA_CERT_PATH";
    pub const TLS_CERT_PATH: &str = "KAFKA_TLS_CERT_PATH";
    pub const TLS_KEY_PATH: &str = "KAFKA_TLS_KEY_PATH";
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct KafkaClientConfig {
    /// Comma separated list of `host:port` pairs.
    #[serde(default)]
    // although we have an alias specified, it currently doesn't work due to: https://github.com/serde-rs/serde/issues/1504
    #[serde(alias = "bootstrapServers")]
    pub bootstrap_servers: String,
    #[serde(
        default,
        deserialize_with = "super::scalar::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_id: Option<String>,
    /// Disable TLS, which is enabled by default.
    #[serde(default)]
    pub plaintext: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sasl: Option<SaslConfig>,
    #[serde(
        default,
        deserialize_with = "super::scalar::map",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub properties: HashMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TlsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<PathBuf>,
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SaslConfig {
    #[serde(default)]
    pub mechanism: SaslMechanism,
    #[serde(deserialize_with = "super::scalar::string")]
    pub username: String,
    #[serde(deserialize_with = "super::scalar::string")]
    pub password: String,
}

impl fmt::Debug for SaslConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaslConfig")
            .field("mechanism", &self.mechanism)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum SaslMechanism {
    #[default]
    #[serde(rename = "PLAIN")]
    Plain,
    #[serde(rename = "SCRAM-SHA-256")]
    ScramSha256,
    #[serde(rename = "SCRAM-SHA-512")]
    ScramSha512,
}

impl SaslMechanism {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::ScramSha256 => "SCRAM-SHA-256",
            Self::ScramSha512 => "SCRAM-SHA-512",
        }
    }
}

impl FromStr for SaslMechanism {
    type Err = ConfigIssue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PLAIN" => Ok(Self::Plain),
            "SCRAM-SHA-256" => Ok(Self::ScramSha256),
            "SCRAM-SHA-512" => Ok(Self::ScramSha512),
            _ => Err(ConfigIssue::UnknownSaslMechanism(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("at least one broker must be set")]
    MissingBrokers,
    #[error("SASL username must be set")]
    MissingSaslUsername,
    #[error("SASL password must be set")]
    MissingSaslPassword,
    #[error("unknown SASL mechanism: {0}")]
    UnknownSaslMechanism(String),
    #[error("TLS client certificate and key must be set together")]
    IncompleteClientCertificate,
    #[error("plaintext and TLS settings are mutually exclusive")]
    PlaintextWithTls,
    #[error("invalid boolean value for {name}: {value}")]
    InvalidFlag { name: &'static str, value: String },
}

/// All issues found while finalizing a configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidConfig(pub Vec<ConfigIssue>);

impl InvalidConfig {
    pub fn issues(&self) -> &[ConfigIssue] {
        &self.0
    }
}

impl fmt::Display for InvalidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid kafka configuration")?;
        for (i, issue) in self.0.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { "; " })?;
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for InvalidConfig {}

impl KafkaClientConfig {
    /// Translate the properties from env-var style keys (with underscore) to Kafka style keys (with dots).
    pub fn translate(mut self) -> Self {
        let mut result = HashMap::with_capacity(self.properties.len());
        for (k, v) in self.properties {
            result.insert(k.replace('_', "."), v);
        }
        self.properties = result;
        self
    }

    /// The configured brokers, with empty entries removed.
    pub fn brokers(&self) -> impl Iterator<Item = &str> {
        self.bootstrap_servers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn security_protocol(&self) -> &'static str {
        match (self.tls.is_some(), self.sasl.is_some()) {
            (false, false) => "PLAINTEXT",
            (true, false) => "SSL",
            (false, true) => "SASL_PLAINTEXT",
            (true, true) => "SASL_SSL",
        }
    }

    /// Fill in defaults from the process environment and validate the result.
    pub fn finalize(self) -> Result<Self, InvalidConfig> {
        self.finalize_with(|name| std::env::var(name).ok())
    }

    /// Fill in defaults from `lookup` and validate the result.
    ///
    /// Values set on the configuration take precedence over the environment. All issues are
    /// collected, not only the first one.
    pub fn finalize_with<F>(mut self, lookup: F) -> Result<Self, InvalidConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut issues = Vec::new();

        // brokers

        if self.brokers().next().is_none() {
            if let Some(brokers) = lookup(env::BROKERS) {
                self.bootstrap_servers = brokers;
            }
        }
        let brokers: Vec<String> = self.brokers().map(String::from).collect();
        if brokers.is_empty() {
            issues.push(ConfigIssue::MissingBrokers);
        }
        self.bootstrap_servers = brokers.join(",");

        // sasl

        if self.sasl.is_none() {
            if let Some(username) = lookup(env::USERNAME) {
                let mechanism = match lookup(env::SASL_MECHANISM) {
                    Some(mechanism) => mechanism.parse().unwrap_or_else(|issue| {
                        issues.push(issue);
                        SaslMechanism::default()
                    }),
                    None => SaslMechanism::default(),
                };
                self.sasl = Some(SaslConfig {
                    mechanism,
                    username,
                    password: lookup(env::PASSWORD).unwrap_or_default(),
                });
            }
        }
        if let Some(sasl) = &self.sasl {
            if sasl.username.is_empty() {
                issues.push(ConfigIssue::MissingSaslUsername);
            }
            if sasl.password.is_empty() {
                issues.push(ConfigIssue::MissingSaslPassword);
            }
        }

        // tls

        if self.plaintext && self.tls.is_some() {
            issues.push(ConfigIssue::PlaintextWithTls);
        } else if !self.plaintext && self.tls.is_none() {
            if flag(&lookup, env::PLAINTEXT, &mut issues) {
                self.plaintext = true;
            } else {
                self.tls = Some(TlsConfig {
                    ca_cert_path: lookup(env::TLS_CA_CERT_PATH).map(PathBuf::from),
                    cert_path: lookup(env::TLS_CERT_PATH).map(PathBuf::from),
                    key_path: lookup(env::TLS_KEY_PATH).map(PathBuf::from),
                    insecure_skip_verify: flag(&lookup, env::TLS_INSECURE, &mut issues),
                });
            }
        }
        if let Some(tls) = &self.tls {
            if tls.cert_path.is_some() != tls.key_path.is_some() {
                issues.push(ConfigIssue::IncompleteClientCertificate);
            }
        }

        if issues.is_empty() {
            log::debug!("Finalized kafka client config: {:?}", self);
            Ok(self)
        } else {
            Err(InvalidConfig(issues))
        }
    }
}

fn flag<F>(lookup: &F, name: &'static str, issues: &mut Vec<ConfigIssue>) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => false,
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => {
                issues.push(ConfigIssue::InvalidFlag { name, value });
                false
            }
        },
    }
}

#[cfg(feature = "rdkafka")]
impl From<KafkaClientConfig> for rdkafka::ClientConfig {
    fn from(cfg: KafkaClientConfig) -> Self {
        let mut result = rdkafka::ClientConfig::new();
        result.set(
            "bootstrap.servers",
            cfg.brokers().collect::<Vec<_>>().join(","),
        );
        result.set("security.protocol", cfg.security_protocol());

        if let Some(client_id) = &cfg.client_id {
            result.set("client.id", client_id);
        }

        if let Some(sasl) = &cfg.sasl {
            result.set("sasl.mechanism", sasl.mechanism.as_str());
            result.set("sasl.username", &sasl.username);
            result.set("sasl.password", &sasl.password);
        }

        if let Some(tls) = &cfg.tls {
            if let Some(path) = &tls.ca_cert_path {
                result.set("ssl.ca.location", path.to_string_lossy());
            }
            if let Some(path) = &tls.cert_path {
                result.set("ssl.certificate.location", path.to_string_lossy());
            }
            if let Some(path) = &tls.key_path {
                result.set("ssl.key.location", path.to_string_lossy());
            }
            if tls.insecure_skip_verify {
                result.set("enable.ssl.certificate.verification", "false");
                result.set("ssl.endpoint.identification.algorithm", "none");
            }
        }

        for (k, v) in cfg.properties {
            result.set(k.replace('_', "."), v);
        }

        result
    }
}
