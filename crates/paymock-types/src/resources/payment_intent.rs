//! Payment intent types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Customer, PaymentMethod, Resource};
use crate::expandable::Expandable;
use crate::id::ResourceKind;

/// Status shared by payment and setup intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
	/// Awaiting a payment method
	RequiresPaymentMethod,
	/// Payment method attached, awaiting confirmation
	RequiresConfirmation,
	/// Completed
	Succeeded,
}

/// Payment intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
	/// Unique identifier
	pub id: String,
	/// Always `payment_intent`
	pub object: String,
	/// Amount in smallest currency unit
	pub amount: i64,
	/// Lowercase ISO currency code
	pub currency: String,
	/// Paying customer
	pub customer: Option<Expandable<Customer>>,
	/// Payment method used
	pub payment_method: Option<Expandable<PaymentMethod>>,
	/// Accepted payment method types
	pub payment_method_types: Vec<String>,
	/// Payment status
	pub status: IntentStatus,
	/// Custom metadata
	pub metadata: HashMap<String, String>,
	/// Creation timestamp (unix seconds)
	pub created: i64,
	/// Live or test mode
	pub livemode: bool,
}

impl Resource for PaymentIntent {
	const KIND: ResourceKind = ResourceKind::PaymentIntent;

	fn id(&self) -> &str {
		&self.id
	}

	fn customer_id(&self) -> Option<&str> {
		self.customer.as_ref().map(Expandable::id)
	}
}
