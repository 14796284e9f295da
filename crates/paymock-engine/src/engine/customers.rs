//! Customers, card tokens and payment methods.

use chrono::{Datelike, Utc};
use paymock_types::params::{
	AttachPaymentMethod, CardParams, CreateCustomer, CreatePaymentMethod, CreateToken,
	UpdateCustomer,
};
use paymock_types::{
	ApiError, ApiResult, CardDetails, Customer, Expandable, PaymentMethod, PaymentMethodType,
	Resource, ResourceKind, Token, TokenCard, new_id,
};

use super::billing::owned_by;
use super::{MockEngine, merge_metadata};
use crate::registry::WriteSet;
use crate::validation;

/// Card number used when a request carries no card details.
const TEST_CARD_NUMBER: &str = "4242424242424242";

impl MockEngine {
	/// Creates a customer.
	///
	/// A `source` token is consumed and its card becomes the customer's
	/// `default_source`. A `payment_method` is attached and becomes the
	/// default payment method.
	pub fn create_customer(&self, params: CreateCustomer) -> ApiResult<Customer> {
		validation::customer_create(&params)?;
		let customer = self.registry.transaction(|view| {
			let mut writes = WriteSet::new();
			let mut customer = Customer {
				id: ResourceKind::Customer.new_id(),
				object: ResourceKind::Customer.object_name().to_string(),
				email: params.email,
				name: params.name,
				default_source: None,
				default_payment_method: None,
				metadata: params.metadata.unwrap_or_default(),
				created: Utc::now().timestamp(),
				livemode: self.settings.livemode,
			};

			if let Some(source) = params.source.as_deref() {
				let token = view.reference::<Token>("source", source)?;
				if token.used {
					return Err(ApiError::invalid(
						"source",
						format!("You cannot use a card token more than once: {}.", token.id),
					));
				}
				let mut token = token.clone();
				token.used = true;
				customer.default_source = Some(token.card.id.clone());
				writes.put(token);
			}

			if let Some(method_id) = params.payment_method.as_deref() {
				let method = view.reference::<PaymentMethod>("payment_method", method_id)?;
				let method = bind_payment_method(method, &customer.id, "payment_method")?;
				customer.default_payment_method = Some(Expandable::from(method_id));
				writes.put(method);
			}

			writes.put(customer.clone());
			Ok((writes, customer))
		})?;
		tracing::debug!(customer = %customer.id, "created customer");
		Ok(customer)
	}

	/// Updates contact details, default payment method or metadata.
	pub fn update_customer(&self, id: &str, params: UpdateCustomer) -> ApiResult<Customer> {
		validation::customer_update(&params)?;
		let customer = self.registry.transaction(|view| {
			let mut customer = view.get::<Customer>(id)?.clone();
			if let Some(email) = params.email {
				customer.email = Some(email);
			}
			if let Some(name) = params.name {
				customer.name = Some(name);
			}
			if let Some(method_id) = params.default_payment_method.as_deref() {
				let method = view.reference::<PaymentMethod>("default_payment_method", method_id)?;
				owned_by(method, &customer, "default_payment_method")?;
				customer.default_payment_method = Some(Expandable::from(method_id));
			}
			merge_metadata(&mut customer.metadata, params.metadata);

			let mut writes = WriteSet::new();
			writes.put(customer.clone());
			Ok((writes, customer))
		})?;
		tracing::debug!(customer = %customer.id, "updated customer");
		Ok(customer)
	}

	/// Creates a single-use card token.
	///
	/// Missing card details fall back to a valid test card.
	pub fn create_token(&self, params: CreateToken) -> ApiResult<Token> {
		validation::token_create(&params)?;
		let token = Token {
			id: ResourceKind::Token.new_id(),
			object: ResourceKind::Token.object_name().to_string(),
			card: TokenCard {
				id: new_id("card"),
				details: card_details(params.card.as_ref()),
			},
			used: false,
			created: Utc::now().timestamp(),
			livemode: self.settings.livemode,
		};
		self.registry.put(token.clone());
		tracing::debug!(token = %token.id, "created card token");
		Ok(token)
	}

	/// Creates an unattached payment method.
	pub fn create_payment_method(&self, params: CreatePaymentMethod) -> ApiResult<PaymentMethod> {
		validation::payment_method_create(&params)?;
		let type_ = params.type_.ok_or_else(|| ApiError::missing("type"))?;
		let method = PaymentMethod {
			id: ResourceKind::PaymentMethod.new_id(),
			object: ResourceKind::PaymentMethod.object_name().to_string(),
			type_,
			card: match type_ {
				PaymentMethodType::Card => Some(card_details(params.card.as_ref())),
				_ => None,
			},
			customer: None,
			created: Utc::now().timestamp(),
			livemode: self.settings.livemode,
		};
		self.registry.put(method.clone());
		tracing::debug!(payment_method = %method.id, "created payment method");
		Ok(method)
	}

	/// Attaches a payment method to a customer.
	///
	/// Attaching to the customer that already owns the method is a no-op.
	///
	/// # Errors
	///
	/// `InvalidState` when the method belongs to another customer.
	pub fn attach_payment_method(
		&self,
		id: &str,
		params: AttachPaymentMethod,
	) -> ApiResult<PaymentMethod> {
		validation::payment_method_attach(&params)?;
		let method = self.registry.transaction(|view| {
			let method = view.get::<PaymentMethod>(id)?;
			let customer_id = params.customer.as_deref().unwrap_or_default();
			let customer = view.reference::<Customer>("customer", customer_id)?;
			let method = bind_payment_method(method, &customer.id, "payment_method")?;

			let mut writes = WriteSet::new();
			writes.put(method.clone());
			Ok((writes, method))
		})?;
		tracing::debug!(
			payment_method = %method.id,
			customer = ?method.customer_id(),
			"attached payment method"
		);
		Ok(method)
	}
}

/// Returns a copy of `method` attached to `customer`.
///
/// # Errors
///
/// `InvalidState` naming `param` when another customer owns the method.
pub(super) fn bind_payment_method(
	method: &PaymentMethod,
	customer: &str,
	param: &str,
) -> ApiResult<PaymentMethod> {
	match method.customer_id() {
		Some(owner) if owner != customer => Err(ApiError::state(
			param,
			format!(
				"The payment method '{}' is already attached to another customer.",
				method.id
			),
		)),
		_ => {
			let mut method = method.clone();
			method.customer = Some(Expandable::from(customer));
			Ok(method)
		}
	}
}

fn card_details(card: Option<&CardParams>) -> CardDetails {
	let number: String = card
		.and_then(|card| card.number.as_deref())
		.unwrap_or(TEST_CARD_NUMBER)
		.chars()
		.filter(char::is_ascii_digit)
		.collect();
	CardDetails {
		brand: card_brand(&number).to_string(),
		last4: number[number.len().saturating_sub(4)..].to_string(),
		exp_month: card.and_then(|card| card.exp_month).unwrap_or(12),
		exp_year: card
			.and_then(|card| card.exp_year)
			.unwrap_or_else(|| Utc::now().year() + 1),
	}
}

fn card_brand(number: &str) -> &'static str {
	match number.as_bytes() {
		[b'4', ..] => "Visa",
		[b'3', b'4' | b'7', ..] => "American Express",
		[b'5', b'1'..=b'5', ..] | [b'2', ..] => "MasterCard",
		[b'6', ..] => "Discover",
		_ => "Unknown",
	}
}
