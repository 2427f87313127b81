use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "aula_cache_hit_total",
            Unit::Count,
            "Total number of cache-aside reads served from the store."
        );
        describe_counter!(
            "aula_cache_miss_total",
            Unit::Count,
            "Total number of cache-aside reads that fell through to a loader."
        );
        describe_counter!(
            "aula_cache_degraded_total",
            Unit::Count,
            "Total number of reads that degraded to a direct load because the store failed."
        );
        describe_counter!(
            "aula_cache_invalidate_total",
            Unit::Count,
            "Total number of cache keys purged by invalidation passes."
        );
        describe_counter!(
            "aula_cache_invalidate_failed_total",
            Unit::Count,
            "Total number of cache keys whose purge failed and stayed stale."
        );
        describe_counter!(
            "aula_notify_delivered_total",
            Unit::Count,
            "Total number of notifications delivered to live sessions."
        );
        describe_counter!(
            "aula_notify_dropped_total",
            Unit::Count,
            "Total number of notifications dropped because no session was bound."
        );
        describe_gauge!(
            "aula_realtime_sessions",
            Unit::Count,
            "Current number of connected realtime sessions."
        );
    });
}
