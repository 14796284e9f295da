//! rstest fixtures.
//!
//! Each fixture builds its own engine, so tests never share records.

use std::sync::Arc;

use paymock_engine::{EngineSettings, ExpansionPolicy, MockEngine};
use rstest::fixture;

use crate::helper::MockHelper;
use crate::logging::init_test_tracing;

/// Fresh engine with default settings.
#[fixture]
pub fn engine() -> Arc<MockEngine> {
	init_test_tracing();
	Arc::new(MockEngine::new())
}

/// Fresh engine that rejects unexpandable paths.
#[fixture]
pub fn strict_engine() -> Arc<MockEngine> {
	init_test_tracing();
	let settings = EngineSettings::default().with_expansion(ExpansionPolicy::Strict);
	Arc::new(MockEngine::with_settings(settings).expect("strict settings are valid"))
}

/// Helper over a fresh engine.
#[fixture]
pub fn helper(engine: Arc<MockEngine>) -> MockHelper {
	MockHelper::new(engine)
}
