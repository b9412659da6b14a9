use log::LevelFilter;
use tracing_subscriber::filter::{LevelFilter as TracingLevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, registry};

/// Installs a `tracing-subscriber` fmt layer as the global default and bridges the `log` facade
/// (used throughout `agent-core`/`agent-memstore`/`agent-crypto`) into it via `tracing-log`.
///
/// No OpenTelemetry exporter here: unlike an HTTP service, a raw-socket agent has no inbound
/// trace-context header to continue a span from, so there is nothing for OTLP export to add.
pub(crate) fn init(level: LevelFilter) {
	tracing_log::LogTracer::init().expect("LogTracer::init must be called at most once");
	let level = match level {
		LevelFilter::Off => TracingLevelFilter::OFF,
		LevelFilter::Error => TracingLevelFilter::ERROR,
		LevelFilter::Warn => TracingLevelFilter::WARN,
		LevelFilter::Info => TracingLevelFilter::INFO,
		LevelFilter::Debug => TracingLevelFilter::DEBUG,
		LevelFilter::Trace => TracingLevelFilter::TRACE,
	};
	registry().with(Targets::new().with_default(level)).with(fmt::layer()).init();
}
