//! Payment method types.

use serde::{Deserialize, Serialize};

use super::{Customer, Resource};
use crate::expandable::Expandable;
use crate::id::ResourceKind;

/// Kind of payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
	/// Credit or debit card
	Card,
	/// SEPA direct debit
	SepaDebit,
	/// US bank account
	UsBankAccount,
}

/// Non-sensitive card details.
///
/// Only the brand and last four digits are kept; full card numbers never
/// leave the parameter structs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
	/// Card brand (visa, mastercard, amex, ...)
	pub brand: String,
	/// Last four digits
	pub last4: String,
	/// Expiration month (1-12)
	pub exp_month: u32,
	/// Expiration year (4 digits)
	pub exp_year: i32,
}

/// Payment method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
	/// Unique identifier
	pub id: String,
	/// Always `payment_method`
	pub object: String,
	/// Payment method type
	#[serde(rename = "type")]
	pub type_: PaymentMethodType,
	/// Card details for card payment methods
	pub card: Option<CardDetails>,
	/// Customer the method is attached to
	pub customer: Option<Expandable<Customer>>,
	/// Creation timestamp (unix seconds)
	pub created: i64,
	/// Live or test mode
	pub livemode: bool,
}

impl Resource for PaymentMethod {
	const KIND: ResourceKind = ResourceKind::PaymentMethod;

	fn id(&self) -> &str {
		&self.id
	}

	fn customer_id(&self) -> Option<&str> {
		self.customer.as_ref().map(Expandable::id)
	}
}
