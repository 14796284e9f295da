//! Checkout Session types for hosted payment pages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Customer, PaymentIntent, PaymentMethod, Resource, SetupIntent, Subscription};
use crate::expandable::Expandable;
use crate::id::ResourceKind;

/// Checkout session mode.
///
/// Determines which resource the session derives: a payment intent, a setup
/// intent, or (on completion) a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
	/// One-time payment
	#[default]
	Payment,
	/// Save a payment method for later
	Setup,
	/// Recurring subscription
	Subscription,
}

impl CheckoutMode {
	/// Wire value of the mode.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Payment => "payment",
			Self::Setup => "setup",
			Self::Subscription => "subscription",
		}
	}
}

/// Lifecycle state of a checkout session. `Complete` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
	/// Created, waiting for the customer
	Open,
	/// Customer finished checkout
	Complete,
}

/// Payment state of a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPaymentStatus {
	/// Not paid yet
	Unpaid,
	/// Funds collected
	Paid,
	/// Setup-mode session, nothing to pay
	NoPaymentRequired,
}

/// A purchased item, stored in the order it was submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
	/// Unique identifier
	pub id: String,
	/// Display name
	pub description: String,
	/// Plan backing the item, if priced from the catalog
	pub price: Option<String>,
	/// Number of units
	pub quantity: u64,
	/// Price of one unit in the smallest currency unit
	pub unit_amount: i64,
	/// `unit_amount × quantity`
	pub amount_total: i64,
	/// Lowercase ISO currency code
	pub currency: String,
}

/// Checkout session for hosted payment pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
	/// Unique identifier
	pub id: String,
	/// Always `checkout.session`
	pub object: String,
	/// Session mode
	pub mode: CheckoutMode,
	/// Session status (open, complete)
	pub status: CheckoutStatus,
	/// Payment status (paid, unpaid, no_payment_required)
	pub payment_status: CheckoutPaymentStatus,
	/// Redirect target after a successful checkout
	pub success_url: String,
	/// Redirect target when the customer backs out
	pub cancel_url: Option<String>,
	/// Hosted page URL
	pub url: String,
	/// Associated customer
	pub customer: Option<Expandable<Customer>>,
	/// Email to prefill, used to create a customer on completion
	pub customer_email: Option<String>,
	/// Purchased items
	pub line_items: Vec<LineItem>,
	/// Sum of line items before discounts
	pub amount_subtotal: Option<i64>,
	/// Sum of line items
	pub amount_total: Option<i64>,
	/// Currency shared by all line items
	pub currency: Option<String>,
	/// Accepted payment method types
	pub payment_method_types: Vec<String>,
	/// Derived payment intent (payment mode)
	pub payment_intent: Option<Expandable<PaymentIntent>>,
	/// Derived setup intent (setup mode)
	pub setup_intent: Option<Expandable<SetupIntent>>,
	/// Subscription created on completion (subscription mode)
	pub subscription: Option<Expandable<Subscription>>,
	/// Payment method supplied on completion
	pub payment_method: Option<Expandable<PaymentMethod>>,
	/// Caller-supplied reference
	pub client_reference_id: Option<String>,
	/// Custom metadata
	pub metadata: HashMap<String, String>,
	/// Creation timestamp (unix seconds)
	pub created: i64,
	/// Live or test mode
	pub livemode: bool,
}

impl CheckoutSession {
	/// Returns true once the session reached its terminal state.
	pub fn is_complete(&self) -> bool {
		self.status == CheckoutStatus::Complete
	}
}

impl Resource for CheckoutSession {
	const KIND: ResourceKind = ResourceKind::CheckoutSession;

	fn id(&self) -> &str {
		&self.id
	}

	fn customer_id(&self) -> Option<&str> {
		self.customer.as_ref().map(Expandable::id)
	}
}
