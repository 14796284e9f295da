use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{PaymentMethod, Resource};
use crate::expandable::Expandable;
use crate::id::ResourceKind;

/// Customer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
	/// Unique identifier
	pub id: String,
	/// Always `customer`
	pub object: String,
	/// Contact email
	pub email: Option<String>,
	/// Full name
	pub name: Option<String>,
	/// Card source created from a token
	pub default_source: Option<String>,
	/// Payment method used for invoices
	pub default_payment_method: Option<Expandable<PaymentMethod>>,
	/// Custom metadata
	pub metadata: HashMap<String, String>,
	/// Creation timestamp (unix seconds)
	pub created: i64,
	/// Live or test mode
	pub livemode: bool,
}

impl Resource for Customer {
	const KIND: ResourceKind = ResourceKind::Customer;

	fn id(&self) -> &str {
		&self.id
	}

	fn customer_id(&self) -> Option<&str> {
		Some(&self.id)
	}
}
