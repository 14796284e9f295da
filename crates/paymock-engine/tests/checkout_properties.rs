//! Property-based tests for checkout session creation.

use paymock_engine::MockEngine;
use paymock_types::params::{CreateCheckoutSession, LineItemParams};
use paymock_types::{ApiError, CheckoutMode, ErrorKind, PaymentIntent, SetupIntent};
use proptest::prelude::*;

fn item_strategy() -> impl Strategy<Value = (i64, u64)> {
	(0i64..1_000_000, 1u64..50)
}

fn session_params(
	mode: Option<CheckoutMode>,
	currency: &str,
	items: &[(i64, u64)],
) -> CreateCheckoutSession {
	CreateCheckoutSession {
		mode,
		success_url: Some("https://example.com/success".to_string()),
		line_items: Some(
			items
				.iter()
				.enumerate()
				.map(|(index, (amount, quantity))| LineItemParams {
					name: Some(format!("item {}", index)),
					amount: Some(*amount),
					currency: Some(currency.to_string()),
					quantity: Some(*quantity),
					..Default::default()
				})
				.collect(),
		),
		..Default::default()
	}
}

proptest! {
	/// Test: payment intent amount is the line item sum
	///
	/// Category: Property
	/// Verifies that a payment-mode session derives an intent whose amount is
	/// the sum of amount times quantity and whose currency is the first
	/// item's currency.
	#[test]
	fn prop_payment_intent_sums_line_items(
		items in prop::collection::vec(item_strategy(), 1..8),
		currency in "[a-z]{3}",
	) {
		let engine = MockEngine::new();

		let session = engine
			.create_checkout_session(session_params(None, &currency, &items))
			.unwrap();

		let expected: i64 = items.iter().map(|(amount, quantity)| amount * *quantity as i64).sum();
		let intent_id = session.payment_intent.as_ref().unwrap().id();
		let intent: PaymentIntent = engine.retrieve(intent_id, &[] as &[&str]).unwrap();
		prop_assert_eq!(intent.amount, expected);
		prop_assert_eq!(&intent.currency, &currency);
		prop_assert_eq!(session.amount_total, Some(expected));
	}

	/// Test: mixed currencies are rejected without side effects
	///
	/// Category: Property
	/// Verifies that any pair of distinct currencies fails on `line_items`
	/// and leaves the registry empty.
	#[test]
	fn prop_mixed_currencies_rejected(
		first in "[a-z]{3}",
		second in "[a-z]{3}",
		(amount, quantity) in item_strategy(),
	) {
		prop_assume!(first != second);
		let engine = MockEngine::new();
		let mut params = session_params(None, &first, &[(amount, quantity)]);
		let mut other = params.line_items.as_ref().unwrap()[0].clone();
		other.currency = Some(second);
		params.line_items.as_mut().unwrap().push(other);

		let error = engine.create_checkout_session(params).unwrap_err();

		prop_assert_eq!(error.param(), Some("line_items"));
		prop_assert_eq!(engine.registry().counts().iter().map(|(_, n)| n).sum::<usize>(), 0);
	}

	/// Test: line items are mandatory outside setup mode
	///
	/// Category: Property
	/// Verifies that payment and subscription sessions without line items
	/// fail on `line_items` whatever the other parameters are.
	#[test]
	fn prop_line_items_required(
		subscription in any::<bool>(),
		customer in proptest::option::of("[a-z_]{1,16}"),
		success_url in "[a-z/.:]{1,24}",
	) {
		let engine = MockEngine::new();
		let mode = if subscription { CheckoutMode::Subscription } else { CheckoutMode::Payment };

		let error = engine
			.create_checkout_session(CreateCheckoutSession {
				mode: Some(mode),
				customer,
				success_url: Some(success_url),
				..Default::default()
			})
			.unwrap_err();

		prop_assert_eq!(error, ApiError::missing("line_items"));
	}

	/// Test: setup sessions always carry a setup intent
	///
	/// Category: Property
	/// Verifies that setup mode needs no line items and always yields a
	/// stored setup intent.
	#[test]
	fn prop_setup_mode_yields_setup_intent(
		types in proptest::option::of(prop::collection::vec("card|sepa_debit", 1..3)),
	) {
		let engine = MockEngine::new();

		let session = engine
			.create_checkout_session(CreateCheckoutSession {
				mode: Some(CheckoutMode::Setup),
				success_url: Some("https://example.com".to_string()),
				payment_method_types: types,
				..Default::default()
			})
			.unwrap();

		let intent_id = session.setup_intent.as_ref().unwrap().id();
		prop_assert!(!intent_id.is_empty());
		prop_assert!(engine.registry().contains::<SetupIntent>(intent_id));
	}

	/// Test: never-inserted session ids are not found
	///
	/// Category: Property
	#[test]
	fn prop_unknown_session_not_found(id in "[a-zA-Z0-9_]{1,32}") {
		let engine = MockEngine::new();

		let error = engine.retrieve_checkout_session::<&str>(&id, &[]).unwrap_err();

		prop_assert_eq!(error.kind(), ErrorKind::NotFound);
		prop_assert_eq!(error.param(), Some("checkout_session"));
		prop_assert_eq!(error.http_status().as_u16(), 404);
	}
}
