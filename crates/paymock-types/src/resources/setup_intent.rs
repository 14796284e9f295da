use serde::{Deserialize, Serialize};

use super::{Customer, IntentStatus, PaymentMethod, Resource};
use crate::expandable::Expandable;
use crate::id::ResourceKind;

/// Setup intent: collects a payment method without charging it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupIntent {
	/// Unique identifier
	pub id: String,
	/// Always `setup_intent`
	pub object: String,
	/// Customer the payment method will belong to
	pub customer: Option<Expandable<Customer>>,
	/// Collected payment method
	pub payment_method: Option<Expandable<PaymentMethod>>,
	/// Accepted payment method types
	pub payment_method_types: Vec<String>,
	/// Setup status
	pub status: IntentStatus,
	/// Creation timestamp (unix seconds)
	pub created: i64,
	/// Live or test mode
	pub livemode: bool,
}

impl Resource for SetupIntent {
	const KIND: ResourceKind = ResourceKind::SetupIntent;

	fn id(&self) -> &str {
		&self.id
	}

	fn customer_id(&self) -> Option<&str> {
		self.customer.as_ref().map(Expandable::id)
	}
}
