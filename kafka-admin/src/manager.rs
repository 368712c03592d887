use crate::{
    reconcile, ConnectionProvider, DeleteOptions, DeleteTopicsError, ManagerConfig, ManagerError,
    RdKafkaConnector, TopicAdmin, TopicDeleteError, TopicErrors, TopicOutcome, TopicResponse,
    TransportError,
};
use queue_service_api::{kafka::MESSAGING_SYSTEM, Topic};
use rdkafka::{admin::AdminClient, client::DefaultClientContext};
use std::collections::BTreeSet;
use tracing::{field, Instrument, Span};

/// Manages Kafka topics.
///
/// The manager exclusively owns its admin client. It can be shared between tasks, as long as
/// the admin client can.
pub struct Manager<A: TopicAdmin = AdminClient<DefaultClientContext>> {
    admin: A,
    options: DeleteOptions,
}

impl Manager {
    /// Create a new manager, connecting with `rdkafka`.
    pub fn new(config: ManagerConfig) -> Result<Self, ManagerError> {
        Self::with_provider(config, &RdKafkaConnector)
    }
}

impl<A: TopicAdmin> Manager<A> {
    /// Create a new manager, using the admin client created by `provider`.
    ///
    /// The configuration gets finalized using the process environment first.
    pub fn with_provider<P>(config: ManagerConfig, provider: &P) -> Result<Self, ManagerError>
    where
        P: ConnectionProvider<Admin = A>,
    {
        let config = config.finalize()?;

        log::debug!("Config: {:#?}", config);

        let admin = provider
            .connect(&config.client)
            .map_err(ManagerError::Connection)?;

        log::info!("Created topic manager for: {}", config.bootstrap_servers);

        Ok(Self::from_admin(
            admin,
            DeleteOptions {
                request_timeout: config.request_timeout,
                operation_timeout: config.operation_timeout,
            },
        ))
    }

    /// Wrap an already established admin client.
    pub fn from_admin(admin: A, options: DeleteOptions) -> Self {
        Self { admin, options }
    }

    /// Release the admin client, closing its connections to the brokers.
    pub fn close(self) -> Result<(), ManagerError> {
        drop(self.admin);
        log::info!("Closed topic manager");
        Ok(())
    }

    /// Delete one or more topics, with a single request to the cluster.
    ///
    /// No error is returned for topics that do not exist. A failure of one topic doesn't stop
    /// the processing of the others, all failures are reported together.
    ///
    /// Dropping the returned future cancels the request.
    pub async fn delete_topics(&self, topics: &[Topic]) -> Result<(), DeleteTopicsError> {
        let span = tracing::info_span!(
            "DeleteTopics",
            otel.kind = "client",
            messaging.system = MESSAGING_SYSTEM,
            messaging.batch.size = topics.len(),
            otel.status_code = field::Empty,
            otel.status_message = field::Empty,
        );

        self.run_delete(topics).instrument(span).await
    }

    async fn run_delete(&self, topics: &[Topic]) -> Result<(), DeleteTopicsError> {
        let names: Vec<&str> = topics
            .iter()
            .map(Topic::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if names.is_empty() {
            tracing::debug!("No topics to delete");
            return Ok(());
        }

        let responses = match self.request(&names).await {
            Ok(responses) => responses,
            Err(err) => {
                tracing::warn!(error = %err, "DeleteTopics returned an error");
                mark_failed("DeleteTopics returned an error");
                return Err(err.into());
            }
        };

        let mut errors = Vec::new();
        for (topic, outcome) in reconcile(names, responses) {
            match outcome {
                TopicOutcome::AlreadyAbsent => {
                    tracing::debug!(%topic, "kafka topic does not exist");
                }
                TopicOutcome::Failed(failure) => {
                    tracing::warn!(%topic, error = %failure, "failed to delete kafka topic");
                    mark_failed("failed to delete one or more topic");
                    errors.push(TopicDeleteError { topic, failure });
                }
                TopicOutcome::Deleted => {
                    tracing::info!(%topic, "deleted kafka topic");
                }
            }
        }

        match TopicErrors::join(errors) {
            Some(errors) => Err(errors.into()),
            None => Ok(()),
        }
    }

    async fn request(&self, names: &[&str]) -> Result<Vec<TopicResponse>, TransportError> {
        let request = self.admin.delete_topics(names, &self.options);

        match self.options.request_timeout {
            Some(timeout) => tokio::time::timeout(timeout, request)
                .await
                .map_err(|_| TransportError::Timeout(timeout))?
                .map_err(TransportError::from),
            None => request.await.map_err(TransportError::from),
        }
    }
}

fn mark_failed(message: &str) {
    let span = Span::current();
    span.record("otel.status_code", "ERROR");
    span.record("otel.status_message", message);
}
