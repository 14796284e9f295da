//! Shortcut builders for common test setups.
//!
//! [`MockHelper`] calls the same engine operations client code would, with
//! parameter sets that are valid out of the box. Every fixture struct
//! implements `Default`; override only what the test cares about.

use std::sync::Arc;

use paymock_engine::MockEngine;
use paymock_types::params::{
	CardParams, CreateCheckoutSession, CreateCustomer, CreatePaymentMethod, CreatePlan,
	CreateProduct, CreateToken, LineItemParams,
};
use paymock_types::{
	ApiResult, CheckoutMode, CheckoutSession, PaymentMethod, PaymentMethodType, Plan, PlanInterval,
	Product,
};

/// Product created by [`MockHelper::create_product`].
#[derive(Debug, Clone)]
pub struct ProductFixture {
	/// Caller-chosen id; generated when `None`
	pub id: Option<String>,
	/// Display name
	pub name: String,
}

impl Default for ProductFixture {
	fn default() -> Self {
		Self {
			id: None,
			name: "Default Product".to_string(),
		}
	}
}

/// Plan created by [`MockHelper::create_plan`].
#[derive(Debug, Clone)]
pub struct PlanFixture {
	/// Caller-chosen id; generated when `None`
	pub id: Option<String>,
	/// Product to price; a default product is created when `None`
	pub product: Option<String>,
	/// Price per interval in the smallest currency unit
	pub amount: i64,
	/// Three-letter currency code
	pub currency: String,
	/// Billing interval
	pub interval: PlanInterval,
	/// Free trial length
	pub trial_period_days: Option<u32>,
}

impl Default for PlanFixture {
	fn default() -> Self {
		Self {
			id: None,
			product: None,
			amount: 1337,
			currency: "usd".to_string(),
			interval: PlanInterval::Month,
			trial_period_days: None,
		}
	}
}

/// Checkout session created by [`MockHelper::create_checkout_session`].
#[derive(Debug, Clone)]
pub struct CheckoutFixture {
	/// Session mode
	pub mode: CheckoutMode,
	/// Email of the customer to create
	pub customer_email: Option<String>,
	/// Card token consumed by the customer to create
	pub customer_source: Option<String>,
	/// Plan sold by the session, as a single line item of quantity 1
	pub plan: Option<String>,
	/// Explicit line items, used when `plan` is `None`
	pub line_items: Option<Vec<LineItemParams>>,
	/// Redirect target after payment
	pub success_url: String,
}

impl Default for CheckoutFixture {
	fn default() -> Self {
		Self {
			mode: CheckoutMode::Payment,
			customer_email: None,
			customer_source: None,
			plan: None,
			line_items: None,
			success_url: "https://example.com/success".to_string(),
		}
	}
}

/// Seeds a [`MockEngine`] with ready-made resources.
#[derive(Debug, Clone)]
pub struct MockHelper {
	engine: Arc<MockEngine>,
}

impl MockHelper {
	/// Creates a helper operating on `engine`.
	pub fn new(engine: Arc<MockEngine>) -> Self {
		Self { engine }
	}

	/// The engine this helper writes to.
	pub fn engine(&self) -> &MockEngine {
		&self.engine
	}

	/// Creates a product.
	pub fn create_product(&self, fixture: ProductFixture) -> ApiResult<Product> {
		self.engine.create_product(CreateProduct {
			id: fixture.id,
			name: Some(fixture.name),
			..Default::default()
		})
	}

	/// Creates a plan, and a product for it unless one is given.
	pub fn create_plan(&self, fixture: PlanFixture) -> ApiResult<Plan> {
		let product = match fixture.product {
			Some(product) => product,
			None => self.create_product(ProductFixture::default())?.id,
		};
		self.engine.create_plan(CreatePlan {
			id: fixture.id,
			amount: Some(fixture.amount),
			currency: Some(fixture.currency),
			interval: Some(fixture.interval),
			product: Some(product),
			trial_period_days: fixture.trial_period_days,
			..Default::default()
		})
	}

	/// Creates a card token and returns its id.
	///
	/// Empty card parameters produce a valid Visa test card.
	pub fn generate_card_token(&self, card: CardParams) -> ApiResult<String> {
		let token = self.engine.create_token(CreateToken { card: Some(card) })?;
		Ok(token.id)
	}

	/// Creates an unattached card payment method.
	pub fn create_payment_method(&self) -> ApiResult<PaymentMethod> {
		self.engine.create_payment_method(CreatePaymentMethod {
			type_: Some(PaymentMethodType::Card),
			card: None,
		})
	}

	/// Creates a checkout session.
	///
	/// A customer is created first when `customer_email` or
	/// `customer_source` is set. Line items come from `plan`, else from
	/// `line_items`, else a default is chosen for the mode: one ad-hoc item
	/// for payment mode, a freshly created plan for subscription mode and
	/// none for setup mode.
	pub fn create_checkout_session(&self, fixture: CheckoutFixture) -> ApiResult<CheckoutSession> {
		let customer = if fixture.customer_email.is_some() || fixture.customer_source.is_some() {
			let customer = self.engine.create_customer(CreateCustomer {
				email: fixture.customer_email.clone(),
				source: fixture.customer_source,
				..Default::default()
			})?;
			Some(customer.id)
		} else {
			None
		};

		let line_items = match (fixture.plan, fixture.line_items, fixture.mode) {
			(Some(plan), _, _) => Some(vec![price_item(plan)]),
			(None, Some(items), _) => Some(items),
			(None, None, CheckoutMode::Payment) => Some(vec![LineItemParams {
				name: Some("Default item".to_string()),
				amount: Some(1000),
				currency: Some("usd".to_string()),
				quantity: Some(1),
				..Default::default()
			}]),
			(None, None, CheckoutMode::Subscription) => {
				let plan = self.create_plan(PlanFixture::default())?;
				Some(vec![price_item(plan.id)])
			}
			(None, None, CheckoutMode::Setup) => None,
		};

		self.engine.create_checkout_session(CreateCheckoutSession {
			mode: Some(fixture.mode),
			success_url: Some(fixture.success_url),
			customer,
			customer_email: fixture.customer_email,
			line_items,
			..Default::default()
		})
	}

	/// Completes `session` with `payment_method` and returns the id of the
	/// produced resource: the subscription, payment intent or setup intent.
	pub fn complete_checkout_session(
		&self,
		session: &CheckoutSession,
		payment_method: &PaymentMethod,
	) -> ApiResult<String> {
		let completion = self
			.engine
			.complete_checkout_session(&session.id, &payment_method.id)?;
		tracing::debug!(
			checkout_session = %session.id,
			produced = %completion.id(),
			"fixture session completed"
		);
		Ok(completion.id().to_string())
	}
}

fn price_item(plan: String) -> LineItemParams {
	LineItemParams {
		price: Some(plan),
		quantity: Some(1),
		..Default::default()
	}
}
