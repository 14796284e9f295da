//! Resource kinds and id allocation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Every kind of resource the mock engine stores.
///
/// Declaration order is the canonical lock order used by multi-table
/// transitions, so new kinds must be appended rather than inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
	/// Catalog product
	Product,
	/// Recurring price attached to a product
	Plan,
	/// Customer record
	Customer,
	/// Single-use card token
	Token,
	/// Payment method (card, debit, bank account)
	PaymentMethod,
	/// One-off payment
	PaymentIntent,
	/// Payment method collection without a charge
	SetupIntent,
	/// Recurring billing for a customer
	Subscription,
	/// Hosted checkout flow
	CheckoutSession,
}

impl ResourceKind {
	/// All kinds in canonical order.
	pub const ALL: [ResourceKind; 9] = [
		ResourceKind::Product,
		ResourceKind::Plan,
		ResourceKind::Customer,
		ResourceKind::Token,
		ResourceKind::PaymentMethod,
		ResourceKind::PaymentIntent,
		ResourceKind::SetupIntent,
		ResourceKind::Subscription,
		ResourceKind::CheckoutSession,
	];

	/// Parameter name reported by errors about this kind (e.g. `checkout_session`).
	pub fn param_name(self) -> &'static str {
		match self {
			Self::Product => "product",
			Self::Plan => "plan",
			Self::Customer => "customer",
			Self::Token => "token",
			Self::PaymentMethod => "payment_method",
			Self::PaymentIntent => "payment_intent",
			Self::SetupIntent => "setup_intent",
			Self::Subscription => "subscription",
			Self::CheckoutSession => "checkout_session",
		}
	}

	/// Value of the `object` field on serialized resources.
	pub fn object_name(self) -> &'static str {
		match self {
			Self::CheckoutSession => "checkout.session",
			other => other.param_name(),
		}
	}

	/// Prefix of ids allocated for this kind.
	pub fn id_prefix(self) -> &'static str {
		match self {
			Self::Product => "prod",
			Self::Plan => "plan",
			Self::Customer => "cus",
			Self::Token => "tok",
			Self::PaymentMethod => "pm",
			Self::PaymentIntent => "pi",
			Self::SetupIntent => "seti",
			Self::Subscription => "sub",
			Self::CheckoutSession => "cs",
		}
	}

	/// Allocates a fresh id for this kind.
	pub fn new_id(self) -> String {
		new_id(self.id_prefix())
	}
}

impl fmt::Display for ResourceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.param_name())
	}
}

impl FromStr for ResourceKind {
	type Err = ApiError;

	/// Accepts both the parameter name and the `object` name.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|kind| kind.param_name() == s || kind.object_name() == s)
			.ok_or_else(|| ApiError::invalid("object", format!("unknown resource type `{}`", s)))
	}
}

/// Allocates an opaque id of the form `{prefix}_{32 hex chars}`.
pub fn new_id(prefix: &str) -> String {
	format!("{}_{}", prefix, Uuid::new_v4().simple())
}
