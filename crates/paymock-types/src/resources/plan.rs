use serde::{Deserialize, Serialize};

use super::{Product, Resource};
use crate::expandable::Expandable;
use crate::id::ResourceKind;

/// Billing interval of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanInterval {
	/// Daily billing
	Day,
	/// Weekly billing
	Week,
	/// Monthly billing
	Month,
	/// Yearly billing
	Year,
}

/// Recurring price for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
	/// Unique identifier
	pub id: String,
	/// Always `plan`
	pub object: String,
	/// Amount per interval in smallest currency unit
	pub amount: i64,
	/// Lowercase ISO currency code
	pub currency: String,
	/// Billing interval
	pub interval: PlanInterval,
	/// Number of intervals per billing period
	pub interval_count: u32,
	/// Product being sold
	pub product: Expandable<Product>,
	/// Whether new subscriptions may use the plan
	pub active: bool,
	/// Short description
	pub nickname: Option<String>,
	/// Trial length for new subscriptions
	pub trial_period_days: Option<u32>,
	/// Creation timestamp (unix seconds)
	pub created: i64,
	/// Live or test mode
	pub livemode: bool,
}

impl Resource for Plan {
	const KIND: ResourceKind = ResourceKind::Plan;

	fn id(&self) -> &str {
		&self.id
	}
}
