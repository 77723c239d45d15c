//! Logging and OpenTelemetry setup.
//!
//! Console output always goes to stderr through a fmt layer. When an OTLP
//! endpoint is configured, traces, metrics, and logs are exported there as
//! well. Dispatch diagnostics (one event per failed item, the final count,
//! source failures) use [`DIAGNOSTICS_TARGET`], which the filter always lets
//! through regardless of the configured level.

pub mod dispatch;
pub mod metrics;

use crate::error::{Error, Result};
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;

/// Target of the per-item failure, summary, and source error events.
pub const DIAGNOSTICS_TARGET: &str = "fanout::diagnostics";

/// Configuration for telemetry initialization.
pub struct TelemetryConfig {
    /// Optional OTLP endpoint (e.g. "http://localhost:4317").
    pub endpoint: Option<String>,
    /// The service name reported in telemetry signals.
    pub service_name: String,
    /// Filter directive used when `RUST_LOG` is unset.
    pub log_level: String,
}

/// Providers of an active OTLP export.
struct OtlpExport {
    tracer: SdkTracerProvider,
    meter: SdkMeterProvider,
    logger: SdkLoggerProvider,
}

/// Keeps OTLP export alive; flushes and shuts it down on drop.
pub struct TelemetryGuard {
    export: Option<OtlpExport>,
}

impl TelemetryGuard {
    /// Push buffered spans, metrics, and logs out now.
    ///
    /// Called before exit so short runs still export their final counts.
    pub fn force_flush(&self) {
        let Some(export) = &self.export else { return };
        let _ = export.tracer.force_flush();
        let _ = export.meter.force_flush();
        let _ = export.logger.force_flush();
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(export) = self.export.take() {
            let _ = export.logger.shutdown();
            let _ = export.meter.shutdown();
            let _ = export.tracer.shutdown();
        }
    }
}

/// Build the event filter: `RUST_LOG` if set, else `log_level`, plus a
/// directive that keeps dispatch diagnostics visible.
pub fn env_filter(log_level: &str) -> Result<EnvFilter> {
    let diagnostics = format!("{DIAGNOSTICS_TARGET}=info")
        .parse()
        .map_err(|e| Error::Other(format!("bad diagnostics directive: {e}")))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    Ok(filter.add_directive(diagnostics))
}

/// Initialize console logging and, if configured, OTLP export.
///
/// Returns a guard that must be held for the lifetime of the application.
///
/// # Errors
///
/// Returns an error if an OTLP exporter fails to build or a global
/// subscriber was already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard> {
    use opentelemetry::trace::TracerProvider as _;
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let filter = env_filter(&config.log_level)?;
    let export = match config.endpoint {
        Some(endpoint) => Some(otlp_export(&endpoint, config.service_name)?),
        None => None,
    };

    let trace_layer = export
        .as_ref()
        .map(|e| tracing_opentelemetry::layer().with_tracer(e.tracer.tracer("fanout-rs")));
    let log_layer = export.as_ref().map(|e| {
        opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge::new(&e.logger)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
        .with(trace_layer)
        .with(log_layer)
        .try_init()
        .map_err(|e| Error::Other(format!("failed to init tracing subscriber: {e}")))?;

    Ok(TelemetryGuard { export })
}

/// Build the trace, metric, and log pipelines for an OTLP endpoint and
/// register the meter provider globally.
fn otlp_export(endpoint: &str, service_name: String) -> Result<OtlpExport> {
    use opentelemetry_otlp::{LogExporter, MetricExporter, SpanExporter, WithExportConfig as _};

    let exporter_error = |signal: &str, e: opentelemetry_otlp::ExporterBuildError| {
        Error::Other(format!("failed to create OTLP {signal} exporter: {e}"))
    };
    let resource = opentelemetry_sdk::Resource::builder()
        .with_service_name(service_name)
        .build();

    let spans = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| exporter_error("span", e))?;
    let tracer = SdkTracerProvider::builder()
        .with_batch_exporter(spans)
        .with_resource(resource.clone())
        .build();

    let metrics = MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| exporter_error("metric", e))?;
    let meter = SdkMeterProvider::builder()
        .with_periodic_exporter(metrics)
        .with_resource(resource.clone())
        .build();
    opentelemetry::global::set_meter_provider(meter.clone());

    let logs = LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| exporter_error("log", e))?;
    let logger = SdkLoggerProvider::builder()
        .with_batch_exporter(logs)
        .with_resource(resource)
        .build();

    Ok(OtlpExport {
        tracer,
        meter,
        logger,
    })
}
