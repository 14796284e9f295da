//! Request parameters for every supported operation.
//!
//! Every field is optional at the type level so that a missing required
//! parameter surfaces as a structured [`ApiError`](crate::ApiError) from the
//! validator instead of a decoding failure. All structs deserialize from the
//! JSON bodies a transport shim would forward and implement `Default` for
//! struct-update syntax in tests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::resources::{CheckoutMode, PaymentMethodType, PlanInterval};

/// Parameters for creating a checkout session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateCheckoutSession {
	/// Session mode, `payment` when omitted
	pub mode: Option<CheckoutMode>,
	/// Success redirect URL
	pub success_url: Option<String>,
	/// Cancel redirect URL
	pub cancel_url: Option<String>,
	/// Existing customer id
	pub customer: Option<String>,
	/// Email of a customer to create on completion
	pub customer_email: Option<String>,
	/// Accepted payment method types
	pub payment_method_types: Option<Vec<String>>,
	/// Items to purchase
	pub line_items: Option<Vec<LineItemParams>>,
	/// Caller-supplied reference
	pub client_reference_id: Option<String>,
	/// Custom metadata
	pub metadata: Option<HashMap<String, String>>,
}

/// One requested line item: either a catalog `price` (plan id) or an ad-hoc
/// `name` + `amount` + `currency`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItemParams {
	/// Plan id used as price
	pub price: Option<String>,
	/// Ad-hoc item name
	pub name: Option<String>,
	/// Ad-hoc unit amount
	pub amount: Option<i64>,
	/// Ad-hoc currency
	pub currency: Option<String>,
	/// Number of units
	pub quantity: Option<u64>,
}

/// Parameters for creating a payment intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatePaymentIntent {
	/// Amount in smallest currency unit
	pub amount: Option<i64>,
	/// Currency code
	pub currency: Option<String>,
	/// Paying customer
	pub customer: Option<String>,
	/// Payment method to use
	pub payment_method: Option<String>,
	/// Accepted payment method types
	pub payment_method_types: Option<Vec<String>>,
	/// Custom metadata
	pub metadata: Option<HashMap<String, String>>,
}

/// Parameters for updating a payment intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdatePaymentIntent {
	/// New amount; only while the intent has not succeeded
	pub amount: Option<i64>,
	/// Metadata to merge
	pub metadata: Option<HashMap<String, String>>,
}

/// Parameters for confirming a payment intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmPaymentIntent {
	/// Payment method to charge; required unless the intent already has one
	pub payment_method: Option<String>,
}

/// Parameters for creating a setup intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateSetupIntent {
	/// Customer the payment method will belong to
	pub customer: Option<String>,
	/// Accepted payment method types
	pub payment_method_types: Option<Vec<String>>,
}

/// One requested subscription item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionItemParams {
	/// Plan id
	pub plan: Option<String>,
	/// Number of units, 1 when omitted
	pub quantity: Option<u64>,
}

/// Parameters for creating a subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateSubscription {
	/// Subscribing customer
	pub customer: Option<String>,
	/// Single plan shorthand for `items`
	pub plan: Option<String>,
	/// Subscribed plans
	pub items: Option<Vec<SubscriptionItemParams>>,
	/// Payment method for renewals
	pub default_payment_method: Option<String>,
	/// Custom metadata
	pub metadata: Option<HashMap<String, String>>,
}

/// Parameters for updating a subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateSubscription {
	/// Cancel when the current period ends
	pub cancel_at_period_end: Option<bool>,
	/// Payment method for renewals
	pub default_payment_method: Option<String>,
	/// Metadata to merge
	pub metadata: Option<HashMap<String, String>>,
}

/// Parameters for creating a customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateCustomer {
	/// Contact email
	pub email: Option<String>,
	/// Full name
	pub name: Option<String>,
	/// Card token to store as the default source
	pub source: Option<String>,
	/// Payment method to attach
	pub payment_method: Option<String>,
	/// Custom metadata
	pub metadata: Option<HashMap<String, String>>,
}

/// Parameters for updating a customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateCustomer {
	/// Contact email
	pub email: Option<String>,
	/// Full name
	pub name: Option<String>,
	/// Attached payment method to use for invoices
	pub default_payment_method: Option<String>,
	/// Metadata to merge
	pub metadata: Option<HashMap<String, String>>,
}

/// Raw card data accepted when creating payment methods and tokens.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardParams {
	/// Card number
	pub number: Option<String>,
	/// Expiration month (1-12)
	pub exp_month: Option<u32>,
	/// Expiration year (4 digits)
	pub exp_year: Option<i32>,
}

// Card numbers stay out of logs and assertion output.
impl std::fmt::Debug for CardParams {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CardParams")
			.field("number", &self.number.as_ref().map(|_| "<redacted>"))
			.field("exp_month", &self.exp_month)
			.field("exp_year", &self.exp_year)
			.finish()
	}
}

/// Parameters for creating a payment method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatePaymentMethod {
	/// Payment method type
	#[serde(rename = "type")]
	pub type_: Option<PaymentMethodType>,
	/// Card data for `card` methods
	pub card: Option<CardParams>,
}

/// Parameters for attaching a payment method to a customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachPaymentMethod {
	/// Customer to attach to
	pub customer: Option<String>,
}

/// Parameters for creating a card token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateToken {
	/// Card data; a default test card when omitted
	pub card: Option<CardParams>,
}

/// Parameters for creating a plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatePlan {
	/// Caller-chosen id
	pub id: Option<String>,
	/// Amount per interval
	pub amount: Option<i64>,
	/// Currency code
	pub currency: Option<String>,
	/// Billing interval
	pub interval: Option<PlanInterval>,
	/// Intervals per billing period, 1 when omitted
	pub interval_count: Option<u32>,
	/// Product id
	pub product: Option<String>,
	/// Short description
	pub nickname: Option<String>,
	/// Trial length for new subscriptions
	pub trial_period_days: Option<u32>,
}

/// Parameters for creating a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateProduct {
	/// Caller-chosen id
	pub id: Option<String>,
	/// Display name
	pub name: Option<String>,
	/// Long description
	pub description: Option<String>,
	/// Custom metadata
	pub metadata: Option<HashMap<String, String>>,
}

/// Parameters shared by list operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListParams {
	/// Only resources belonging to this customer
	pub customer: Option<String>,
	/// Maximum number of results, 10 when omitted (at most 100)
	pub limit: Option<usize>,
}

impl ListParams {
	/// Default page size.
	pub const DEFAULT_LIMIT: usize = 10;
	/// Largest accepted page size.
	pub const MAX_LIMIT: usize = 100;
}
