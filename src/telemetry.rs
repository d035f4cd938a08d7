use std::time::Duration;

use anyhow::{Context, Result};
use opentelemetry::global;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{TonicExporterBuilder, WithExportConfig};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::Config;
use opentelemetry_sdk::{runtime, Resource};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

/// Installs the global subscriber.
///
/// Spans and metrics are exported over OTLP only when `endpoint` is set. Console output is
/// kept whenever nothing is exported or `console` is requested.
pub(crate) fn init_telemetry(endpoint: Option<&str>, console: bool) -> Result<()> {
    let (trace_layer, metrics_layer) = match endpoint {
        Some(endpoint) => {
            let service_resource = Resource::new(vec![
                KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
                KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
            ]);

            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(build_tonic_exporter(endpoint))
                .with_trace_config(Config::default().with_resource(service_resource.clone()))
                .install_batch(runtime::Tokio)
                .context("Failed to install tracer")?;

            let meter = opentelemetry_otlp::new_pipeline()
                .metrics(runtime::Tokio)
                .with_exporter(build_tonic_exporter(endpoint))
                .with_resource(service_resource)
                .build()
                .context("Failed to install meter")?;

            global::set_text_map_propagator(TraceContextPropagator::new());
            (
                Some(OpenTelemetryLayer::new(tracer)),
                Some(MetricsLayer::new(meter)),
            )
        }
        None => (None, None),
    };

    let console_layer = (endpoint.is_none() || console).then(tracing_subscriber::fmt::layer);

    Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("INFO")))
        .with(trace_layer)
        .with(metrics_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")
}

fn build_tonic_exporter(endpoint: &str) -> TonicExporterBuilder {
    opentelemetry_otlp::new_exporter()
        .tonic()
        .with_timeout(Duration::from_secs(15))
        .with_endpoint(endpoint)
}
