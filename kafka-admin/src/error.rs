use queue_service_api::{kafka::InvalidConfig, Topic};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use std::{fmt, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("invalid manager config")]
    Configuration(#[from] InvalidConfig),
    #[error("failed creating kafka client")]
    Connection(#[source] KafkaError),
}

/// The batch request as a whole could not be executed.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Kafka(#[from] KafkaError),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum DeleteTopicsError {
    #[error("failed to delete kafka topics: {0}")]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Topics(#[from] TopicErrors),
}

impl DeleteTopicsError {
    /// The per-topic errors, empty if the batch request itself failed.
    pub fn topic_errors(&self) -> &[TopicDeleteError] {
        match self {
            Self::Transport(_) => &[],
            Self::Topics(errors) => errors.errors(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TopicFailure {
    #[error("{0}")]
    Broker(RDKafkaErrorCode),
    #[error("missing response from broker")]
    MissingResponse,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("failed to delete topic \"{topic}\": {failure}")]
pub struct TopicDeleteError {
    pub topic: Topic,
    pub failure: TopicFailure,
}

/// The failed topics of a single batch request, ordered by topic name.
///
/// Never empty, see [`TopicErrors::join`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicErrors(Vec<TopicDeleteError>);

impl TopicErrors {
    /// Combine errors, returns `None` if there are none.
    pub fn join<I>(errors: I) -> Option<Self>
    where
        I: IntoIterator<Item = TopicDeleteError>,
    {
        let errors: Vec<_> = errors.into_iter().collect();
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn errors(&self) -> &[TopicDeleteError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn topics(&self) -> impl Iterator<Item = &Topic> {
        self.0.iter().map(|e| &e.topic)
    }

    pub fn into_inner(self) -> Vec<TopicDeleteError> {
        self.0
    }
}

impl fmt::Display for TopicErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for TopicErrors {}

impl IntoIterator for TopicErrors {
    type Item = TopicDeleteError;
    type IntoIter = std::vec::IntoIter<TopicDeleteError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TopicErrors {
    type Item = &'a TopicDeleteError;
    type IntoIter = std::slice::Iter<'a, TopicDeleteError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
