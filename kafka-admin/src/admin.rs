use crate::TopicResponse;
use async_trait::async_trait;
use queue_service_api::kafka::KafkaClientConfig;
use rdkafka::{
    admin::{AdminClient, AdminOptions},
    client::{ClientContext, DefaultClientContext},
    error::KafkaResult,
    ClientConfig,
};
use std::time::Duration;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    pub request_timeout: Option<Duration>,
    pub operation_timeout: Option<Duration>,
}

/// The admin side of a Kafka client.
#[async_trait]
pub trait TopicAdmin: Send + Sync {
    /// Delete all `topics` with a single request.
    ///
    /// An `Err` means the request as a whole failed, otherwise there is one response per topic.
    async fn delete_topics(
        &self,
        topics: &[&str],
        options: &DeleteOptions,
    ) -> KafkaResult<Vec<TopicResponse>>;
}

#[async_trait]
impl<C: ClientContext> TopicAdmin for AdminClient<C> {
    async fn delete_topics(
        &self,
        topics: &[&str],
        options: &DeleteOptions,
    ) -> KafkaResult<Vec<TopicResponse>> {
        let opts = AdminOptions::new()
            .request_timeout(options.request_timeout)
            .operation_timeout(options.operation_timeout);

        let results = AdminClient::delete_topics(self, topics, &opts).await?;

        Ok(results.into_iter().map(TopicResponse::from).collect())
    }
}

/// Establishes admin clients from a finalized configuration.
pub trait ConnectionProvider {
    type Admin: TopicAdmin;

    fn connect(&self, config: &KafkaClientConfig) -> KafkaResult<Self::Admin>;
}

/// Creates `rdkafka` admin clients.
#[derive(Clone, Copy, Debug, Default)]
pub struct RdKafkaConnector;

impl ConnectionProvider for RdKafkaConnector {
    type Admin = AdminClient<DefaultClientContext>;

    fn connect(&self, config: &KafkaClientConfig) -> KafkaResult<Self::Admin> {
        let client_config: ClientConfig = config.clone().into();
        client_config.create()
    }
}
