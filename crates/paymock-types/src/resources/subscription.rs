//! Subscription types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Customer, PaymentMethod, Plan, Resource};
use crate::expandable::Expandable;
use crate::id::ResourceKind;

/// Subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
	/// Billing normally
	Active,
	/// Inside the plan's trial period
	Trialing,
}

/// One plan line of a subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionItem {
	/// Unique identifier
	pub id: String,
	/// Subscribed plan
	pub plan: String,
	/// Number of units
	pub quantity: u64,
}

/// Recurring subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
	/// Unique identifier
	pub id: String,
	/// Always `subscription`
	pub object: String,
	/// Subscribed customer
	pub customer: Expandable<Customer>,
	/// Plan of the first item
	pub plan: Expandable<Plan>,
	/// Subscribed plans
	pub items: Vec<SubscriptionItem>,
	/// Subscription status
	pub status: SubscriptionStatus,
	/// Payment method charged for renewals
	pub default_payment_method: Option<Expandable<PaymentMethod>>,
	/// Current billing period start (unix seconds)
	pub current_period_start: i64,
	/// Current billing period end (unix seconds)
	pub current_period_end: i64,
	/// End of the trial, if the plan has one
	pub trial_end: Option<i64>,
	/// Whether to cancel at period end
	pub cancel_at_period_end: bool,
	/// Custom metadata
	pub metadata: HashMap<String, String>,
	/// Creation timestamp (unix seconds)
	pub created: i64,
	/// Live or test mode
	pub livemode: bool,
}

impl Resource for Subscription {
	const KIND: ResourceKind = ResourceKind::Subscription;

	fn id(&self) -> &str {
		&self.id
	}

	fn customer_id(&self) -> Option<&str> {
		Some(self.customer.id())
	}
}
