#![allow(dead_code)]

use async_trait::async_trait;
use log::LevelFilter;
use queue_kafka_admin::{ConnectionProvider, DeleteOptions, TopicAdmin, TopicResponse};
use queue_service_api::kafka::KafkaClientConfig;
use rdkafka::error::{KafkaError, KafkaResult, RDKafkaErrorCode};
use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};
use tracing::{
    field::{Field, Visit},
    span::{Attributes, Id, Record},
    Event, Level, Subscriber,
};
use tracing_subscriber::{
    layer::{Context, Layer},
    prelude::*,
    registry::LookupSpan,
};

pub fn init() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(LevelFilter::Debug)
        .try_init();
}

type Handler = Box<dyn Fn(&[&str]) -> KafkaResult<Vec<TopicResponse>> + Send + Sync>;

/// What happened to a [`MockAdmin`], also after it got moved into a manager.
#[derive(Clone, Default)]
pub struct MockState {
    calls: Arc<Mutex<Vec<(Vec<String>, DeleteOptions)>>>,
    dropped: Arc<AtomicBool>,
}

impl MockState {
    /// The topics of each delete request.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(topics, _)| topics.clone())
            .collect()
    }

    pub fn options(&self) -> Vec<DeleteOptions> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, options)| options.clone())
            .collect()
    }

    pub fn dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }
}

/// An admin client answering requests with a handler function.
pub struct MockAdmin {
    handler: Handler,
    state: MockState,
}

impl MockAdmin {
    pub fn new<F>(handler: F) -> (Self, MockState)
    where
        F: Fn(&[&str]) -> KafkaResult<Vec<TopicResponse>> + Send + Sync + 'static,
    {
        let state = MockState::default();
        (
            Self {
                handler: Box::new(handler),
                state: state.clone(),
            },
            state,
        )
    }

    /// Answer every topic with the error code from `errors`, or success if there is none.
    pub fn with_errors(errors: &[(&str, RDKafkaErrorCode)]) -> (Self, MockState) {
        let errors: HashMap<String, RDKafkaErrorCode> = errors
            .iter()
            .map(|(topic, code)| (topic.to_string(), *code))
            .collect();

        Self::new(move |topics| {
            Ok(topics
                .iter()
                .map(|topic| match errors.get(*topic) {
                    Some(code) => TopicResponse::err(*topic, *code),
                    None => TopicResponse::ok(*topic),
                })
                .collect())
        })
    }

    /// Fail every request as a whole.
    pub fn unreachable() -> (Self, MockState) {
        Self::new(|_| {
            Err(KafkaError::AdminOp(
                RDKafkaErrorCode::BrokerTransportFailure,
            ))
        })
    }
}

impl Drop for MockAdmin {
    fn drop(&mut self) {
        self.state.dropped.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TopicAdmin for MockAdmin {
    async fn delete_topics(
        &self,
        topics: &[&str],
        options: &DeleteOptions,
    ) -> KafkaResult<Vec<TopicResponse>> {
        self.state.calls.lock().unwrap().push((
            topics.iter().map(|topic| topic.to_string()).collect(),
            options.clone(),
        ));
        (self.handler)(topics)
    }
}

/// An admin client which never answers.
pub struct HangingAdmin;

#[async_trait]
impl TopicAdmin for HangingAdmin {
    async fn delete_topics(
        &self,
        _topics: &[&str],
        _options: &DeleteOptions,
    ) -> KafkaResult<Vec<TopicResponse>> {
        futures::future::pending().await
    }
}

/// Hands out a prepared admin client, or fails to connect.
pub struct MockProvider {
    admin: Mutex<Option<MockAdmin>>,
}

impl MockProvider {
    pub fn new(admin: MockAdmin) -> Self {
        Self {
            admin: Mutex::new(Some(admin)),
        }
    }

    pub fn failing() -> Self {
        Self {
            admin: Mutex::new(None),
        }
    }
}

impl ConnectionProvider for MockProvider {
    type Admin = MockAdmin;

    fn connect(&self, _config: &KafkaClientConfig) -> KafkaResult<Self::Admin> {
        self.admin
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| KafkaError::ClientCreation("no admin client available".into()))
    }
}

#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    pub fn topic(&self) -> Option<&str> {
        self.fields.get("topic").map(String::as_str)
    }

    pub fn message(&self) -> Option<&str> {
        self.fields.get("message").map(String::as_str)
    }
}

#[derive(Clone, Debug)]
pub struct CapturedSpan {
    pub name: String,
    pub fields: HashMap<String, String>,
}

#[derive(Default)]
struct Spans {
    list: Vec<CapturedSpan>,
    ids: HashMap<u64, usize>,
}

/// A layer recording all events and spans.
#[derive(Clone, Default)]
pub struct Capture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    spans: Arc<Mutex<Spans>>,
}

impl Capture {
    /// Record everything on the current thread, until the guard is dropped.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(capture.clone()));
        (capture, guard)
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Events carrying a `topic` field.
    pub fn topic_events(&self) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.topic().is_some())
            .collect()
    }

    pub fn spans(&self, name: &str) -> Vec<CapturedSpan> {
        self.spans
            .lock()
            .unwrap()
            .list
            .iter()
            .filter(|span| span.name == name)
            .cloned()
            .collect()
    }
}

struct FieldVisitor<'a>(&'a mut HashMap<String, String>);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0
            .insert(field.name().to_string(), format!("{:?}", value));
    }
}

impl<S> Layer<S> for Capture
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, _ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        attrs.record(&mut FieldVisitor(&mut fields));

        let mut guard = self.spans.lock().unwrap();
        let spans = &mut *guard;
        spans.list.push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields,
        });
        spans.ids.insert(id.into_u64(), spans.list.len() - 1);
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
        let mut guard = self.spans.lock().unwrap();
        let spans = &mut *guard;
        if let Some(index) = spans.ids.get(&id.into_u64()).copied() {
            values.record(&mut FieldVisitor(&mut spans.list[index].fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor(&mut fields));
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            fields,
        });
    }
}
