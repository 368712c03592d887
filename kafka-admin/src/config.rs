use queue_service_api::kafka::{InvalidConfig, KafkaClientConfig};
use serde::Deserialize;
use std::{ops::Deref, time::Duration};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ManagerConfig {
    #[serde(flatten)]
    pub client: KafkaClientConfig,

    /// Upper bound for a single admin request, until the broker responds.
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,

    /// How long the controller may take to complete the operation on the cluster.
    #[serde(default, with = "humantime_serde")]
    pub operation_timeout: Option<Duration>,
}

impl ManagerConfig {
    pub fn finalize(self) -> Result<Self, InvalidConfig> {
        self.finalize_with(|name| std::env::var(name).ok())
    }

    pub fn finalize_with<F>(self, lookup: F) -> Result<Self, InvalidConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            client: self.client.finalize_with(lookup)?,
            ..self
        })
    }
}

impl Deref for ManagerConfig {
    type Target = KafkaClientConfig;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}
