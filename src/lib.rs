//! # paymock
//!
//! A stateful, in-process mock of a Stripe-style payment API for test suites.
//!
//! paymock keeps checkout sessions, payment and setup intents, subscriptions,
//! customers, payment methods, plans, products and card tokens in an owned
//! [`MockEngine`]. Operations validate their parameters the way the real
//! service does, derive dependent resources (a payment-mode checkout session
//! creates its payment intent, completing a subscription-mode session creates
//! the subscription) and answer retrievals with optional reference
//! expansion.
//!
//! ## Crates
//!
//! - [`types`]: resources, request parameters and the [`ApiError`] taxonomy
//! - [`engine`]: registry, validation, expansion, transitions and the JSON
//!   [`dispatch`] entry point
//! - [`testkit`] (feature `testkit`): [`MockHelper`] and rstest fixtures
//!
//! ## Feature Flags
//!
//! - `testkit` - fixture helpers and test logging setup
//! - `full` (default) - everything
//!
//! ## Quick Example
//!
//! ```
//! use paymock::prelude::*;
//!
//! let engine = MockEngine::new();
//! let session = engine
//!     .create_checkout_session(CreateCheckoutSession {
//!         success_url: Some("https://example.com/success".to_string()),
//!         line_items: Some(vec![LineItemParams {
//!             name: Some("T-shirt".to_string()),
//!             amount: Some(500),
//!             currency: Some("usd".to_string()),
//!             quantity: Some(2),
//!             ..Default::default()
//!         }]),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//! let session = engine
//!     .retrieve_checkout_session(&session.id, &["payment_intent"])
//!     .unwrap();
//! let intent = session.payment_intent.unwrap().into_object().unwrap();
//! assert_eq!(intent.amount, 1000);
//! ```

pub use paymock_engine as engine;
pub use paymock_types as types;

#[cfg(feature = "testkit")]
pub use paymock_testkit as testkit;

pub use paymock_engine::{
	Completion, EngineSettings, ExpansionPolicy, MockEngine, Operation, SettingsError, dispatch,
};
pub use paymock_types::{ApiError, ApiResult, ErrorKind, Expandable, ResourceKind};

#[cfg(feature = "testkit")]
pub use paymock_testkit::{CheckoutFixture, MockHelper, PlanFixture, ProductFixture};

/// Everything a test usually needs, in one import.
pub mod prelude {
	// Engine
	pub use crate::{
		Completion, EngineSettings, ExpansionPolicy, MockEngine, Operation, dispatch,
	};

	// Vocabulary
	pub use paymock_types::params::*;
	pub use paymock_types::{
		ApiError, ApiResult, CheckoutMode, CheckoutSession, Customer, ErrorKind, Expandable,
		IntentStatus, PaymentIntent, PaymentMethod, PaymentMethodType, Plan, PlanInterval,
		Product, ResourceKind, SetupIntent, Subscription, SubscriptionStatus, Token,
	};

	// Testkit feature
	#[cfg(feature = "testkit")]
	pub use crate::{CheckoutFixture, MockHelper, PlanFixture, ProductFixture};
	#[cfg(feature = "testkit")]
	pub use paymock_testkit::init_test_tracing;
}
