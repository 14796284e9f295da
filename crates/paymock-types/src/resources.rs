//! Resource records held by the mock engine.
//!
//! Field names and wire values follow the real payment API so serialized
//! records look like the objects client code expects.

use serde::Serialize;

use crate::id::ResourceKind;

mod checkout;
mod customer;
mod payment_intent;
mod payment_method;
mod plan;
mod product;
mod setup_intent;
mod subscription;
mod token;

pub use checkout::{CheckoutMode, CheckoutPaymentStatus, CheckoutSession, CheckoutStatus, LineItem};
pub use customer::Customer;
pub use payment_intent::{IntentStatus, PaymentIntent};
pub use payment_method::{CardDetails, PaymentMethod, PaymentMethodType};
pub use plan::{Plan, PlanInterval};
pub use product::Product;
pub use setup_intent::SetupIntent;
pub use subscription::{Subscription, SubscriptionItem, SubscriptionStatus};
pub use token::{Token, TokenCard};

/// Common interface of every stored resource.
pub trait Resource: Clone + Serialize {
	/// Kind of this resource.
	const KIND: ResourceKind;

	/// Unique id within the resource's table.
	fn id(&self) -> &str;

	/// Id of the customer this resource belongs to, if any.
	///
	/// Used by list filters.
	fn customer_id(&self) -> Option<&str> {
		None
	}
}

/// Current unix timestamp, the unit of every `created` field.
pub fn now() -> i64 {
	chrono::Utc::now().timestamp()
}
