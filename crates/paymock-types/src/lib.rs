//! Shared vocabulary for the paymock engine.
//!
//! This crate holds everything that describes the mocked payment API without
//! implementing it:
//!
//! - **Resources**: checkout sessions, payment/setup intents, subscriptions,
//!   customers, payment methods, plans, products and card tokens
//! - **Parameters**: typed request bodies for every supported operation
//! - **Errors**: the [`ApiError`] taxonomy with the kind, message, offending
//!   parameter and HTTP status the real service would report
//!
//! References between resources are modelled with [`Expandable`], which holds
//! either a bare id or the fully materialized object.

#![warn(missing_docs)]

pub mod error;
pub mod expandable;
pub mod id;
pub mod params;
pub mod resources;

pub use error::{ApiError, ApiResult, ErrorKind};
pub use expandable::Expandable;
pub use id::{ResourceKind, new_id};
pub use resources::{
	CardDetails, CheckoutMode, CheckoutPaymentStatus, CheckoutSession, CheckoutStatus, Customer,
	IntentStatus, LineItem, PaymentIntent, PaymentMethod, PaymentMethodType, Plan, PlanInterval,
	Product, Resource, SetupIntent, Subscription, SubscriptionItem, SubscriptionStatus, Token,
	TokenCard,
};
