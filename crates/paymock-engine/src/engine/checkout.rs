//! Checkout sessions and their completion.
//!
//! A session's mode decides what it derives. Payment sessions create a
//! payment intent for the line item total, setup sessions create a setup
//! intent, and subscription sessions create nothing until completion, when
//! the subscription itself is created.

use std::collections::HashMap;

use chrono::Utc;
use paymock_types::params::{CreateCheckoutSession, CreateCustomer, LineItemParams, ListParams};
use paymock_types::{
	ApiError, ApiResult, CheckoutMode, CheckoutPaymentStatus, CheckoutSession, CheckoutStatus,
	Customer, Expandable, IntentStatus, LineItem, PaymentIntent, PaymentMethod, Plan, Product,
	Resource, ResourceKind, SetupIntent, new_id,
};
use serde::{Deserialize, Serialize};

use super::MockEngine;
use super::billing::compatible_plans;
use super::customers::bind_payment_method;
use crate::registry::{RegistryView, WriteSet};
use crate::validation;

/// Outcome of completing a checkout session: the resource it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Completion {
	/// The session's payment intent succeeded
	Payment {
		/// Id of the payment intent
		payment_intent: String,
	},
	/// The session's setup intent succeeded
	Setup {
		/// Id of the setup intent
		setup_intent: String,
	},
	/// A subscription was created
	Subscription {
		/// Id of the new subscription
		subscription: String,
	},
}

impl Completion {
	/// Id of the produced resource.
	pub fn id(&self) -> &str {
		match self {
			Self::Payment { payment_intent } => payment_intent,
			Self::Setup { setup_intent } => setup_intent,
			Self::Subscription { subscription } => subscription,
		}
	}

	/// Id of the new subscription, for subscription-mode sessions.
	pub fn subscription(&self) -> Option<&str> {
		match self {
			Self::Subscription { subscription } => Some(subscription),
			_ => None,
		}
	}
}

impl MockEngine {
	/// Creates a checkout session together with the intent its mode derives.
	///
	/// Line items either reference a plan through `price` or carry their own
	/// `name`, `amount` and `currency`. All items must share one currency,
	/// which becomes the session's and its payment intent's currency.
	///
	/// # Errors
	///
	/// The first failing validation rule, or `No such {param}` for an
	/// unknown customer or price. Nothing is stored on error.
	pub fn create_checkout_session(
		&self,
		params: CreateCheckoutSession,
	) -> ApiResult<CheckoutSession> {
		let mode = validation::checkout_session_create(&params)?;
		let payment_method_types = self.payment_method_types(params.payment_method_types);
		let session = self.registry.transaction(|view| {
			let customer = match params.customer.as_deref() {
				Some(id) => Some(view.reference::<Customer>("customer", id)?.id()),
				None => None,
			};
			let line_items =
				resolve_line_items(view, mode, params.line_items.as_deref().unwrap_or_default())?;
			let totals = line_item_totals(&line_items)?;

			let id = ResourceKind::CheckoutSession.new_id();
			let created = Utc::now().timestamp();
			let mut session = CheckoutSession {
				url: self.settings.checkout_url(&id),
				id,
				object: ResourceKind::CheckoutSession.object_name().to_string(),
				mode,
				status: CheckoutStatus::Open,
				payment_status: match mode {
					CheckoutMode::Setup => CheckoutPaymentStatus::NoPaymentRequired,
					_ => CheckoutPaymentStatus::Unpaid,
				},
				success_url: params.success_url.unwrap_or_default(),
				cancel_url: params.cancel_url,
				customer: customer.map(Expandable::from),
				customer_email: params.customer_email,
				line_items,
				amount_subtotal: totals.as_ref().map(|(amount, _)| *amount),
				amount_total: totals.as_ref().map(|(amount, _)| *amount),
				currency: totals.as_ref().map(|(_, currency)| currency.clone()),
				payment_method_types: payment_method_types.clone(),
				payment_intent: None,
				setup_intent: None,
				subscription: None,
				payment_method: None,
				client_reference_id: params.client_reference_id,
				metadata: params.metadata.unwrap_or_default(),
				created,
				livemode: self.settings.livemode,
			};

			let mut writes = WriteSet::new();
			match mode {
				CheckoutMode::Payment => {
					let (amount, currency) = totals.ok_or_else(|| ApiError::missing("line_items"))?;
					let intent = PaymentIntent {
						id: ResourceKind::PaymentIntent.new_id(),
						object: ResourceKind::PaymentIntent.object_name().to_string(),
						amount,
						currency,
						customer: customer.map(Expandable::from),
						payment_method: None,
						payment_method_types,
						status: IntentStatus::RequiresPaymentMethod,
						metadata: HashMap::new(),
						created,
						livemode: self.settings.livemode,
					};
					session.payment_intent = Some(Expandable::from(intent.id.as_str()));
					writes.put(intent);
				}
				CheckoutMode::Setup => {
					let intent = SetupIntent {
						id: ResourceKind::SetupIntent.new_id(),
						object: ResourceKind::SetupIntent.object_name().to_string(),
						customer: customer.map(Expandable::from),
						payment_method: None,
						payment_method_types,
						status: IntentStatus::RequiresPaymentMethod,
						created,
						livemode: self.settings.livemode,
					};
					session.setup_intent = Some(Expandable::from(intent.id.as_str()));
					writes.put(intent);
				}
				CheckoutMode::Subscription => {}
			}
			writes.put(session.clone());
			Ok((writes, session))
		})?;
		tracing::debug!(
			checkout_session = %session.id,
			mode = session.mode.as_str(),
			amount_total = ?session.amount_total,
			"created checkout session"
		);
		Ok(session)
	}

	/// Retrieves a checkout session and expands the requested fields.
	///
	/// # Errors
	///
	/// `No such checkout_session: '{id}'` (404, param `checkout_session`).
	pub fn retrieve_checkout_session<S: AsRef<str>>(
		&self,
		id: &str,
		expand: &[S],
	) -> ApiResult<CheckoutSession> {
		self.retrieve(id, expand)
	}

	/// Lists checkout sessions in creation order.
	pub fn list_checkout_sessions(&self, params: &ListParams) -> ApiResult<Vec<CheckoutSession>> {
		self.list(params)
	}

	/// Completes an open checkout session with a payment method.
	///
	/// Runs as one transaction: either every write below is committed or
	/// none is.
	///
	/// - payment: the payment intent succeeds with the method
	/// - setup: the setup intent succeeds with the method
	/// - subscription: a customer is ensured (the session's, else one created
	///   from `customer_email`), the method is attached to it and becomes its
	///   default when it has none, and a subscription to the session's plans
	///   is created
	///
	/// In every mode the method is attached to the session's customer, if
	/// any, and the session becomes `complete`.
	///
	/// # Errors
	///
	/// `NotFound` for an unknown session, `No such payment_method` (400) for
	/// an unknown method, `InvalidState` when the session is already complete,
	/// its intent already succeeded or the method belongs to another customer.
	pub fn complete_checkout_session(
		&self,
		session_id: &str,
		payment_method_id: &str,
	) -> ApiResult<Completion> {
		let completion = self.registry.transaction(|view| {
			let mut session = view.get::<CheckoutSession>(session_id)?.clone();
			if session.is_complete() {
				return Err(ApiError::state(
					"checkout_session",
					format!("Checkout session '{}' is already complete.", session.id),
				));
			}
			let method = view.reference::<PaymentMethod>("payment_method", payment_method_id)?;

			let mut writes = WriteSet::new();
			let completion = match session.mode {
				CheckoutMode::Payment => {
					self.complete_payment(view, &mut writes, &session, method)?
				}
				CheckoutMode::Setup => self.complete_setup(view, &mut writes, &session, method)?,
				CheckoutMode::Subscription => {
					self.complete_subscription(view, &mut writes, &mut session, method)?
				}
			};
			session.payment_method = Some(Expandable::from(payment_method_id));
			session.status = CheckoutStatus::Complete;
			session.payment_status = match session.mode {
				CheckoutMode::Setup => CheckoutPaymentStatus::NoPaymentRequired,
				_ => CheckoutPaymentStatus::Paid,
			};

			writes.put(session);
			Ok((writes, completion))
		})?;
		tracing::debug!(
			checkout_session = %session_id,
			payment_method = %payment_method_id,
			produced = %completion.id(),
			"completed checkout session"
		);
		Ok(completion)
	}

	fn complete_payment(
		&self,
		view: &RegistryView<'_>,
		writes: &mut WriteSet,
		session: &CheckoutSession,
		method: &PaymentMethod,
	) -> ApiResult<Completion> {
		let intent_id = session
			.payment_intent
			.as_ref()
			.map(|intent| intent.id().to_string())
			.ok_or_else(|| ApiError::state("checkout_session", "Session has no payment intent."))?;
		let mut intent = view.get::<PaymentIntent>(&intent_id)?.clone();
		if intent.status == IntentStatus::Succeeded {
			return Err(ApiError::state(
				"payment_intent",
				format!("Payment intent '{}' has already succeeded.", intent_id),
			));
		}
		if let Some(customer) = session.customer.as_ref() {
			writes.put(bind_payment_method(method, customer.id(), "payment_method")?);
		}
		intent.payment_method = Some(Expandable::from(method.id.as_str()));
		intent.status = IntentStatus::Succeeded;
		writes.put(intent);
		Ok(Completion::Payment {
			payment_intent: intent_id,
		})
	}

	fn complete_setup(
		&self,
		view: &RegistryView<'_>,
		writes: &mut WriteSet,
		session: &CheckoutSession,
		method: &PaymentMethod,
	) -> ApiResult<Completion> {
		let intent_id = session
			.setup_intent
			.as_ref()
			.map(|intent| intent.id().to_string())
			.ok_or_else(|| ApiError::state("checkout_session", "Session has no setup intent."))?;
		let mut intent = view.get::<SetupIntent>(&intent_id)?.clone();
		if intent.status == IntentStatus::Succeeded {
			return Err(ApiError::state(
				"setup_intent",
				format!("Setup intent '{}' has already succeeded.", intent_id),
			));
		}
		if let Some(customer) = session.customer.as_ref() {
			writes.put(bind_payment_method(method, customer.id(), "payment_method")?);
		}
		intent.payment_method = Some(Expandable::from(method.id.as_str()));
		intent.status = IntentStatus::Succeeded;
		writes.put(intent);
		Ok(Completion::Setup {
			setup_intent: intent_id,
		})
	}

	fn complete_subscription(
		&self,
		view: &RegistryView<'_>,
		writes: &mut WriteSet,
		session: &mut CheckoutSession,
		method: &PaymentMethod,
	) -> ApiResult<Completion> {
		let mut customer = match session.customer.as_ref() {
			Some(customer) => view.get::<Customer>(customer.id())?.clone(),
			None => self.customer_from_email(session.customer_email.clone())?,
		};
		let method = bind_payment_method(method, &customer.id, "payment_method")?;
		if customer.default_payment_method.is_none() {
			customer.default_payment_method = Some(Expandable::from(method.id.as_str()));
		}

		let mut plans = Vec::with_capacity(session.line_items.len());
		for (index, item) in session.line_items.iter().enumerate() {
			let param = format!("line_items[{}][price]", index);
			let plan = view.reference::<Plan>(&param, item.price.as_deref().unwrap_or_default())?;
			plans.push((plan, item.quantity));
		}
		let subscription =
			self.new_subscription(&customer.id, &plans, Some(method.id.clone()), HashMap::new())?;

		session.customer = Some(Expandable::from(customer.id.as_str()));
		session.subscription = Some(Expandable::from(subscription.id.as_str()));
		let completion = Completion::Subscription {
			subscription: subscription.id.clone(),
		};
		writes.put(method);
		writes.put(customer);
		writes.put(subscription);
		Ok(completion)
	}

	// Staged only; the caller's transaction commits it with the rest.
	fn customer_from_email(&self, email: Option<String>) -> ApiResult<Customer> {
		let params = CreateCustomer {
			email,
			..Default::default()
		};
		validation::customer_create(&params)?;
		Ok(Customer {
			id: ResourceKind::Customer.new_id(),
			object: ResourceKind::Customer.object_name().to_string(),
			email: params.email,
			name: None,
			default_source: None,
			default_payment_method: None,
			metadata: HashMap::new(),
			created: Utc::now().timestamp(),
			livemode: self.settings.livemode,
		})
	}
}

/// Builds the stored line items, resolving catalog prices against `view`.
fn resolve_line_items(
	view: &RegistryView<'_>,
	mode: CheckoutMode,
	items: &[LineItemParams],
) -> ApiResult<Vec<LineItem>> {
	let mut line_items = Vec::with_capacity(items.len());
	let mut plans = Vec::new();
	for (index, item) in items.iter().enumerate() {
		let quantity = item.quantity.unwrap_or(1);
		let (description, unit_amount, currency) = match item.price.as_deref() {
			Some(price) => {
				let param = format!("line_items[{}][price]", index);
				let plan = view.reference::<Plan>(&param, price)?;
				plans.push((plan, quantity));
				(plan_description(view, plan), plan.amount, plan.currency.clone())
			}
			None => (
				item.name.clone().unwrap_or_default(),
				item.amount.unwrap_or_default(),
				item.currency.as_deref().unwrap_or_default().to_ascii_lowercase(),
			),
		};
		let amount_total = i64::try_from(quantity)
			.ok()
			.and_then(|quantity| unit_amount.checked_mul(quantity))
			.ok_or_else(|| {
				ApiError::invalid(format!("line_items[{}]", index), "amount is too large")
			})?;
		line_items.push(LineItem {
			id: new_id("li"),
			description,
			price: item.price.clone(),
			quantity,
			unit_amount,
			amount_total,
			currency,
		});
	}

	let mismatch = line_items.first().and_then(|first| {
		line_items
			.iter()
			.position(|item| item.currency != first.currency)
	});
	if let Some(index) = mismatch {
		return Err(ApiError::invalid(
			"line_items",
			format!(
				"line_items[{}] is in {} but the session currency is {}",
				index, line_items[index].currency, line_items[0].currency
			),
		));
	}
	if mode == CheckoutMode::Subscription {
		compatible_plans(&plans, |index| format!("line_items[{}][price]", index))?;
	}
	Ok(line_items)
}

fn plan_description(view: &RegistryView<'_>, plan: &Plan) -> String {
	plan.nickname
		.clone()
		.or_else(|| view.find::<Product>(plan.product.id()).map(|product| product.name.clone()))
		.unwrap_or_else(|| plan.id.clone())
}

/// Sum and currency of the line items, `None` when there are none.
fn line_item_totals(items: &[LineItem]) -> ApiResult<Option<(i64, String)>> {
	let Some(first) = items.first() else {
		return Ok(None);
	};
	let amount = items
		.iter()
		.try_fold(0i64, |sum, item| sum.checked_add(item.amount_total))
		.ok_or_else(|| ApiError::invalid("line_items", "total amount is too large"))?;
	Ok(Some((amount, first.currency.clone())))
}

#[cfg(test)]
mod tests {
	use super::*;
	use paymock_types::params::{
		ConfirmPaymentIntent, CreatePaymentMethod, CreatePlan, CreateProduct,
	};
	use paymock_types::{ErrorKind, PaymentMethodType, PlanInterval, Subscription};
	use rstest::{fixture, rstest};

	#[fixture]
	fn engine() -> MockEngine {
		MockEngine::new()
	}

	fn t_shirt(quantity: u64) -> LineItemParams {
		LineItemParams {
			name: Some("T-shirt".to_string()),
			quantity: Some(quantity),
			amount: Some(500),
			currency: Some("usd".to_string()),
			..Default::default()
		}
	}

	fn plan(engine: &MockEngine) -> Plan {
		let product = engine
			.create_product(CreateProduct {
				name: Some("Gold Special".to_string()),
				..Default::default()
			})
			.unwrap();
		engine
			.create_plan(CreatePlan {
				amount: Some(1337),
				currency: Some("usd".to_string()),
				interval: Some(PlanInterval::Month),
				product: Some(product.id),
				..Default::default()
			})
			.unwrap()
	}

	fn card(engine: &MockEngine) -> PaymentMethod {
		engine
			.create_payment_method(CreatePaymentMethod {
				type_: Some(PaymentMethodType::Card),
				..Default::default()
			})
			.unwrap()
	}

	fn subscription_session(engine: &MockEngine, plan: &Plan) -> CheckoutSession {
		engine
			.create_checkout_session(CreateCheckoutSession {
				mode: Some(CheckoutMode::Subscription),
				success_url: Some("https://example.com/success".to_string()),
				customer_email: Some("jonny@appleseed.com".to_string()),
				line_items: Some(vec![LineItemParams {
					price: Some(plan.id.clone()),
					quantity: Some(1),
					..Default::default()
				}]),
				..Default::default()
			})
			.unwrap()
	}

	#[rstest]
	fn test_payment_session_derives_intent(engine: MockEngine) {
		// Act
		let session = engine
			.create_checkout_session(CreateCheckoutSession {
				success_url: Some("https://example.com/success".to_string()),
				line_items: Some(vec![t_shirt(2)]),
				..Default::default()
			})
			.unwrap();

		// Assert
		let intent_id = session.payment_intent.as_ref().unwrap().id();
		let intent: PaymentIntent = engine.retrieve(intent_id, &[] as &[&str]).unwrap();
		assert_eq!(intent.amount, 1000);
		assert_eq!(intent.currency, "usd");
		assert_eq!(session.amount_total, Some(1000));
		assert_eq!(session.payment_status, CheckoutPaymentStatus::Unpaid);
		assert_eq!(session.url, format!("https://checkout.stripe.com/c/pay/{}", session.id));
	}

	#[rstest]
	fn test_catalog_price_line_item(engine: MockEngine) {
		let plan = plan(&engine);

		let session = engine
			.create_checkout_session(CreateCheckoutSession {
				success_url: Some("https://example.com/success".to_string()),
				line_items: Some(vec![LineItemParams {
					price: Some(plan.id.clone()),
					quantity: Some(3),
					..Default::default()
				}]),
				..Default::default()
			})
			.unwrap();

		let item = &session.line_items[0];
		assert_eq!(item.description, "Gold Special");
		assert_eq!(item.unit_amount, 1337);
		assert_eq!(item.amount_total, 3 * 1337);
	}

	#[rstest]
	fn test_unknown_price_names_the_item(engine: MockEngine) {
		let error = engine
			.create_checkout_session(CreateCheckoutSession {
				success_url: Some("https://example.com/success".to_string()),
				line_items: Some(vec![
					t_shirt(1),
					LineItemParams {
						price: Some("plan_missing".to_string()),
						quantity: Some(1),
						..Default::default()
					},
				]),
				..Default::default()
			})
			.unwrap_err();

		assert_eq!(error, ApiError::no_such("line_items[1][price]", "plan_missing"));
		assert_eq!(engine.registry().len::<CheckoutSession>(), 0);
		assert_eq!(engine.registry().len::<PaymentIntent>(), 0);
	}

	#[rstest]
	fn test_price_currency_must_match_ad_hoc_items(engine: MockEngine) {
		let plan = plan(&engine);
		let mut euro = t_shirt(1);
		euro.currency = Some("eur".to_string());

		let error = engine
			.create_checkout_session(CreateCheckoutSession {
				success_url: Some("https://example.com/success".to_string()),
				line_items: Some(vec![
					LineItemParams {
						price: Some(plan.id),
						quantity: Some(1),
						..Default::default()
					},
					euro,
				]),
				..Default::default()
			})
			.unwrap_err();

		assert_eq!(error.param(), Some("line_items"));
	}

	#[rstest]
	fn test_subscription_session_derives_nothing(engine: MockEngine) {
		let plan = plan(&engine);

		let session = subscription_session(&engine, &plan);

		assert!(session.payment_intent.is_none());
		assert!(session.setup_intent.is_none());
		assert!(session.subscription.is_none());
		assert_eq!(engine.registry().len::<PaymentIntent>(), 0);
	}

	#[rstest]
	fn test_complete_subscription_creates_customer_from_email(engine: MockEngine) {
		// Arrange
		let plan = plan(&engine);
		let session = subscription_session(&engine, &plan);
		let method = card(&engine);

		// Act
		let completion = engine.complete_checkout_session(&session.id, &method.id).unwrap();

		// Assert
		let session = engine.retrieve_checkout_session(&session.id, &["customer"]).unwrap();
		let customer = session.customer.unwrap().into_object().unwrap();
		assert_eq!(customer.email.as_deref(), Some("jonny@appleseed.com"));
		assert_eq!(
			customer.default_payment_method.as_ref().map(Expandable::id),
			Some(method.id.as_str())
		);
		let subscription: Subscription = engine
			.retrieve(completion.subscription().unwrap(), &[] as &[&str])
			.unwrap();
		assert_eq!(subscription.customer.id(), customer.id);
		assert_eq!(subscription.plan.id(), plan.id);
		assert_eq!(session.status, CheckoutStatus::Complete);
		assert_eq!(session.payment_status, CheckoutPaymentStatus::Paid);
	}

	#[rstest]
	fn test_complete_twice_is_state_error(engine: MockEngine) {
		let plan = plan(&engine);
		let session = subscription_session(&engine, &plan);
		let method = card(&engine);
		engine.complete_checkout_session(&session.id, &method.id).unwrap();

		let error = engine
			.complete_checkout_session(&session.id, &method.id)
			.unwrap_err();

		assert_eq!(error.kind(), ErrorKind::State);
		assert_eq!(engine.registry().len::<Subscription>(), 1);
	}

	#[rstest]
	fn test_complete_with_unknown_method_writes_nothing(engine: MockEngine) {
		let plan = plan(&engine);
		let session = subscription_session(&engine, &plan);

		let error = engine
			.complete_checkout_session(&session.id, "pm_missing")
			.unwrap_err();

		assert_eq!(error, ApiError::no_such("payment_method", "pm_missing"));
		assert_eq!(engine.registry().len::<Customer>(), 0);
		let stored = engine.registry().get::<CheckoutSession>(&session.id).unwrap();
		assert_eq!(stored, session);
	}

	#[rstest]
	fn test_complete_setup_session(engine: MockEngine) {
		let session = engine
			.create_checkout_session(CreateCheckoutSession {
				mode: Some(CheckoutMode::Setup),
				success_url: Some("https://example.com/success".to_string()),
				..Default::default()
			})
			.unwrap();
		let method = card(&engine);

		let completion = engine.complete_checkout_session(&session.id, &method.id).unwrap();

		let intent: SetupIntent = engine.retrieve(completion.id(), &[] as &[&str]).unwrap();
		assert_eq!(intent.status, IntentStatus::Succeeded);
		assert_eq!(
			intent.payment_method.as_ref().map(Expandable::id),
			Some(method.id.as_str())
		);
		let session = engine.retrieve_checkout_session::<&str>(&session.id, &[]).unwrap();
		assert_eq!(session.payment_status, CheckoutPaymentStatus::NoPaymentRequired);
	}

	#[rstest]
	fn test_complete_after_intent_confirmed_is_state_error(engine: MockEngine) {
		// Arrange
		let session = engine
			.create_checkout_session(CreateCheckoutSession {
				success_url: Some("https://example.com/success".to_string()),
				line_items: Some(vec![t_shirt(1)]),
				..Default::default()
			})
			.unwrap();
		let intent_id = session.payment_intent.as_ref().unwrap().id().to_string();
		let first = card(&engine);
		let second = card(&engine);
		engine
			.confirm_payment_intent(
				&intent_id,
				ConfirmPaymentIntent {
					payment_method: Some(first.id.clone()),
				},
			)
			.unwrap();

		// Act
		let error = engine
			.complete_checkout_session(&session.id, &second.id)
			.unwrap_err();

		// Assert
		assert_eq!(error.kind(), ErrorKind::State);
		assert_eq!(error.param(), Some("payment_intent"));
		let intent: PaymentIntent = engine.retrieve(&intent_id, &[] as &[&str]).unwrap();
		assert_eq!(
			intent.payment_method.as_ref().map(Expandable::id),
			Some(first.id.as_str())
		);
		let session = engine.retrieve_checkout_session::<&str>(&session.id, &[]).unwrap();
		assert_eq!(session.status, CheckoutStatus::Open);
	}

	#[rstest]
	fn test_completion_serializes_with_mode_tag() {
		let completion = Completion::Subscription {
			subscription: "sub_1".to_string(),
		};

		let value = serde_json::to_value(&completion).unwrap();

		assert_eq!(
			value,
			serde_json::json!({ "mode": "subscription", "subscription": "sub_1" })
		);
	}
}
