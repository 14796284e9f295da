//! Test helpers for suites that run against the paymock engine.
//!
//! - [`MockHelper`]: seeds products, plans, card tokens, payment methods and
//!   checkout sessions with valid defaults
//! - [`fixtures`]: rstest fixtures for an engine, a strict engine and a
//!   helper
//! - [`logging::init_test_tracing`]: one-time `tracing` setup for tests

#![warn(missing_docs)]

pub mod fixtures;
pub mod helper;
pub mod logging;

pub use helper::{CheckoutFixture, MockHelper, PlanFixture, ProductFixture};
pub use logging::init_test_tracing;
