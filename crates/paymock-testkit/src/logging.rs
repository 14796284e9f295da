//! Test logging setup.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a test-friendly `tracing` subscriber once per process.
///
/// The filter comes from `RUST_LOG` and defaults to `paymock_engine=debug`.
/// Output goes through the test harness writer, so it only shows for failing
/// tests or with `--nocapture`. A subscriber installed elsewhere wins.
///
/// # Examples
///
/// ```
/// use paymock_testkit::logging::init_test_tracing;
///
/// init_test_tracing();
/// init_test_tracing(); // no-op
/// ```
pub fn init_test_tracing() {
	INIT.call_once(|| {
		let filter = EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| EnvFilter::new("paymock_engine=debug"));
		let _ = tracing_subscriber::fmt()
			.with_env_filter(filter)
			.with_test_writer()
			.try_init();
	});
}
