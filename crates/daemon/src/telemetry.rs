//! OpenTelemetry export (optional)

use anyhow::Result;

/// Initialize OpenTelemetry if an endpoint is configured
///
/// # Environment Variables
///
/// - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (e.g., http://localhost:4317)
/// - `OTEL_SERVICE_NAME`: Service name (default: tokenlined)
///
/// Needs the `telemetry` feature; without it a configured endpoint only
/// produces a warning.
pub fn init_telemetry() -> Result<()> {
    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        tracing::debug!("OpenTelemetry not configured (OTEL_EXPORTER_OTLP_ENDPOINT not set)");
        return Ok(());
    };

    #[cfg(feature = "telemetry")]
    {
        init_exporter(&endpoint)?;
    }

    #[cfg(not(feature = "telemetry"))]
    {
        tracing::warn!(
            endpoint = %endpoint,
            "OpenTelemetry endpoint set but feature 'telemetry' not enabled"
        );
    }

    Ok(())
}

#[cfg(feature = "telemetry")]
fn init_exporter(endpoint: &str) -> Result<()> {
    use opentelemetry::trace::TracerProvider;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::Tracer;
    use tracing_subscriber::layer::SubscriberExt;

    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "tokenlined".to_string());

    tracing::info!(
        service_name = %service_name,
        endpoint = %endpoint,
        "Initializing OpenTelemetry"
    );

    let tracer: Tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)?
        .tracer(service_name);

    let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
    tracing::subscriber::set_global_default(tracing_subscriber::registry().with(telemetry_layer))?;

    tracing::info!("OpenTelemetry initialized successfully");
    Ok(())
}
