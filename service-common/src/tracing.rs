pub use opentelemetry;
use opentelemetry::sdk::trace::Sampler;
pub use tracing_opentelemetry;
pub use tracing_subscriber;

#[cfg(feature = "jaeger")]
pub use opentelemetry_jaeger;

const DEFAULT_SAMPLING_RATIO: f64 = 0.001;

/// Parse a sampling ratio, as found in `OTEL_TRACES_SAMPLER_ARG`.
pub fn sampling_ratio(value: Option<&str>) -> f64 {
    value
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|p| (0.0..=1.0).contains(p))
        .unwrap_or(DEFAULT_SAMPLING_RATIO)
}

pub fn sampler() -> Sampler {
    let value = std::env::var("OTEL_TRACES_SAMPLER_ARG").ok();
    Sampler::TraceIdRatioBased(sampling_ratio(value.as_deref()))
}

/// Initialize the global tracing and logging pipeline for the service `name`.
///
/// Must only be called once per process.
#[cfg(feature = "jaeger")]
pub fn init_tracing(name: &str) -> anyhow::Result<()> {
    use tracing_subscriber::{prelude::*, EnvFilter};

    dotenv::dotenv().ok();

    opentelemetry::global::set_text_map_propagator(
        opentelemetry::sdk::propagation::TraceContextPropagator::new(),
    );
    let tracer = opentelemetry_jaeger::new_pipeline()
        .with_service_name(name)
        .with_trace_config(opentelemetry::sdk::trace::config().with_sampler(sampler()))
        .install_batch(opentelemetry::runtime::Tokio)?;

    tracing_subscriber::Registry::default()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()?;

    log::info!("Using Jaeger tracing");
    Ok(())
}

/// Initialize the global logging pipeline for the service `name`.
///
/// Spans and events are forwarded to `env_logger`. Must only be called once per process.
#[cfg(not(feature = "jaeger"))]
pub fn init_tracing(name: &str) -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    env_logger::try_init()?;

    log::info!("No tracing implementation enabled for {}", name);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sampling_ratio() {
        assert_eq!(sampling_ratio(None), DEFAULT_SAMPLING_RATIO);
        assert_eq!(sampling_ratio(Some("0.5")), 0.5);
        assert_eq!(sampling_ratio(Some(" 1 ")), 1.0);
        assert_eq!(sampling_ratio(Some("always")), DEFAULT_SAMPLING_RATIO);
        assert_eq!(sampling_ratio(Some("2")), DEFAULT_SAMPLING_RATIO);
    }

    #[cfg(not(feature = "jaeger"))]
    #[test]
    fn test_init_once() {
        assert!(init_tracing("queue-service-common").is_ok());
        assert!(init_tracing("queue-service-common").is_err());
    }
}
