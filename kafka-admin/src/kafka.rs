use crate::TopicFailure;
use queue_service_api::Topic;
use rdkafka::{admin::TopicResult, error::RDKafkaErrorCode};
use std::collections::{BTreeMap, BTreeSet};

/// The answer of the broker for a single topic of a batch request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicResponse {
    pub topic: String,
    pub result: Result<(), RDKafkaErrorCode>,
}

impl TopicResponse {
    pub fn ok<S: Into<String>>(topic: S) -> Self {
        Self {
            topic: topic.into(),
            result: Ok(()),
        }
    }

    pub fn err<S: Into<String>>(topic: S, code: RDKafkaErrorCode) -> Self {
        Self {
            topic: topic.into(),
            result: Err(code),
        }
    }
}

impl From<TopicResult> for TopicResponse {
    fn from(result: TopicResult) -> Self {
        match result {
            Ok(topic) => Self::ok(topic),
            Err((topic, code)) => Self::err(topic, code),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TopicOutcome {
    Deleted,
    /// The broker didn't know the topic, which is fine when deleting.
    AlreadyAbsent,
    Failed(TopicFailure),
}

pub fn classify(result: Result<(), RDKafkaErrorCode>) -> TopicOutcome {
    match result {
        Ok(()) => TopicOutcome::Deleted,
        Err(RDKafkaErrorCode::UnknownTopicOrPartition | RDKafkaErrorCode::UnknownTopic) => {
            TopicOutcome::AlreadyAbsent
        }
        Err(code) => TopicOutcome::Failed(TopicFailure::Broker(code)),
    }
}

/// Match the responses of a batch request with the requested topics, ordered by topic name.
///
/// Every distinct requested topic gets exactly one outcome. A topic the broker didn't answer for
/// is a failure, answers for topics that were not requested are dropped.
pub fn reconcile<'a, I>(requested: I, responses: Vec<TopicResponse>) -> Vec<(Topic, TopicOutcome)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut results = BTreeMap::new();
    for response in responses {
        results.entry(response.topic).or_insert(response.result);
    }

    let requested: BTreeSet<&str> = requested.into_iter().collect();
    let outcomes = requested
        .into_iter()
        .map(|topic| {
            let outcome = match results.remove(topic) {
                Some(result) => classify(result),
                None => TopicOutcome::Failed(TopicFailure::MissingResponse),
            };
            (Topic::from(topic), outcome)
        })
        .collect();

    for topic in results.keys() {
        log::warn!("Dropping response for topic which was not requested: {}", topic);
    }

    outcomes
}
