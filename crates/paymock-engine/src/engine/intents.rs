//! Payment and setup intents.

use chrono::Utc;
use paymock_types::params::{
	ConfirmPaymentIntent, CreatePaymentIntent, CreateSetupIntent, UpdatePaymentIntent,
};
use paymock_types::{
	ApiError, ApiResult, CheckoutSession, Customer, Expandable, IntentStatus, PaymentIntent, PaymentMethod,
	Resource, ResourceKind, SetupIntent,
};

use super::customers::bind_payment_method;
use super::{MockEngine, merge_metadata};
use crate::registry::WriteSet;
use crate::validation;

impl MockEngine {
	/// Creates a payment intent, optionally for a customer and with a
	/// payment method ready for confirmation.
	pub fn create_payment_intent(&self, params: CreatePaymentIntent) -> ApiResult<PaymentIntent> {
		validation::payment_intent_create(&params)?;
		let amount = params.amount.ok_or_else(|| ApiError::missing("amount"))?;
		let payment_method_types = self.payment_method_types(params.payment_method_types);
		let intent = self.registry.transaction(|view| {
			let customer = match params.customer.as_deref() {
				Some(id) => Some(view.reference::<Customer>("customer", id)?),
				None => None,
			};
			let payment_method = match params.payment_method.as_deref() {
				Some(id) => Some(view.reference::<PaymentMethod>("payment_method", id)?),
				None => None,
			};
			if let (Some(customer), Some(method)) = (customer, payment_method) {
				bind_payment_method(method, &customer.id, "payment_method")?;
			}

			let intent = PaymentIntent {
				id: ResourceKind::PaymentIntent.new_id(),
				object: ResourceKind::PaymentIntent.object_name().to_string(),
				amount,
				currency: params.currency.unwrap_or_default().to_ascii_lowercase(),
				customer: customer.map(|customer| Expandable::from(customer.id.as_str())),
				payment_method: payment_method.map(|method| Expandable::from(method.id.as_str())),
				payment_method_types,
				status: if payment_method.is_some() {
					IntentStatus::RequiresConfirmation
				} else {
					IntentStatus::RequiresPaymentMethod
				},
				metadata: params.metadata.unwrap_or_default(),
				created: Utc::now().timestamp(),
				livemode: self.settings.livemode,
			};
			let mut writes = WriteSet::new();
			writes.put(intent.clone());
			Ok((writes, intent))
		})?;
		tracing::debug!(payment_intent = %intent.id, amount = intent.amount, "created payment intent");
		Ok(intent)
	}

	/// Updates the amount or metadata of a payment intent.
	///
	/// # Errors
	///
	/// `InvalidState` when changing the amount of a succeeded intent or of an
	/// intent derived from a checkout session.
	pub fn update_payment_intent(
		&self,
		id: &str,
		params: UpdatePaymentIntent,
	) -> ApiResult<PaymentIntent> {
		validation::payment_intent_update(&params)?;
		let intent = self.registry.transaction(|view| {
			let mut intent = view.get::<PaymentIntent>(id)?.clone();
			if let Some(amount) = params.amount {
				if intent.status == IntentStatus::Succeeded {
					return Err(ApiError::state(
						"amount",
						"This PaymentIntent's amount could not be updated because it has a status of succeeded.",
					));
				}
				let session = view.iter::<CheckoutSession>().find(|session| {
					session
						.payment_intent
						.as_ref()
						.is_some_and(|reference| reference.id() == id)
				});
				if let Some(session) = session {
					return Err(ApiError::state(
						"amount",
						format!(
							"The amount of this PaymentIntent is set by checkout session '{}'.",
							session.id
						),
					));
				}
				intent.amount = amount;
			}
			merge_metadata(&mut intent.metadata, params.metadata);

			let mut writes = WriteSet::new();
			writes.put(intent.clone());
			Ok((writes, intent))
		})?;
		tracing::debug!(payment_intent = %intent.id, "updated payment intent");
		Ok(intent)
	}

	/// Confirms a payment intent, charging the given or already set method.
	///
	/// # Errors
	///
	/// `Missing required param: payment_method.` when neither is present,
	/// `InvalidState` when the intent already succeeded.
	pub fn confirm_payment_intent(
		&self,
		id: &str,
		params: ConfirmPaymentIntent,
	) -> ApiResult<PaymentIntent> {
		let intent = self.registry.transaction(|view| {
			let mut intent = view.get::<PaymentIntent>(id)?.clone();
			if intent.status == IntentStatus::Succeeded {
				return Err(ApiError::state(
					"payment_intent",
					"You cannot confirm this PaymentIntent because it has already succeeded.",
				));
			}
			let mut writes = WriteSet::new();
			if let Some(method_id) = params.payment_method.as_deref() {
				let method = view.reference::<PaymentMethod>("payment_method", method_id)?;
				if let Some(customer) = intent.customer.as_ref() {
					writes.put(bind_payment_method(method, customer.id(), "payment_method")?);
				}
				intent.payment_method = Some(Expandable::from(method_id));
			}
			if intent.payment_method.is_none() {
				return Err(ApiError::missing("payment_method"));
			}
			intent.status = IntentStatus::Succeeded;

			writes.put(intent.clone());
			Ok((writes, intent))
		})?;
		tracing::debug!(payment_intent = %intent.id, "confirmed payment intent");
		Ok(intent)
	}

	/// Creates a setup intent.
	pub fn create_setup_intent(&self, params: CreateSetupIntent) -> ApiResult<SetupIntent> {
		let payment_method_types = self.payment_method_types(params.payment_method_types);
		let intent = self.registry.transaction(|view| {
			let customer = match params.customer.as_deref() {
				Some(id) => Some(view.reference::<Customer>("customer", id)?.id()),
				None => None,
			};
			let intent = SetupIntent {
				id: ResourceKind::SetupIntent.new_id(),
				object: ResourceKind::SetupIntent.object_name().to_string(),
				customer: customer.map(Expandable::from),
				payment_method: None,
				payment_method_types,
				status: IntentStatus::RequiresPaymentMethod,
				created: Utc::now().timestamp(),
				livemode: self.settings.livemode,
			};
			let mut writes = WriteSet::new();
			writes.put(intent.clone());
			Ok((writes, intent))
		})?;
		tracing::debug!(setup_intent = %intent.id, "created setup intent");
		Ok(intent)
	}
}
