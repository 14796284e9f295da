//! Request validation.
//!
//! One function per (resource, operation); checkout sessions additionally
//! select a rule set by mode. Rules run in a fixed order and the first
//! violation is returned, so a test asserting on one missing parameter sees
//! the same error every time. Validators only inspect parameters: rules that
//! need the registry (dangling references, plan currencies) run inside the
//! transition that owns the write.

use paymock_types::params::{
	AttachPaymentMethod, CardParams, CreateCheckoutSession, CreateCustomer, CreatePaymentIntent,
	CreatePaymentMethod, CreatePlan, CreateProduct, CreateSubscription, CreateToken,
	LineItemParams, UpdateCustomer, UpdatePaymentIntent,
};
use paymock_types::{ApiError, ApiResult, CheckoutMode, PaymentMethodType};

/// Longest free trial a plan may offer.
pub const MAX_TRIAL_DAYS: u32 = 730;

/// Validates a checkout session creation request and returns its mode.
///
/// Rule order: `success_url`, then the mode's own rules.
pub fn checkout_session_create(params: &CreateCheckoutSession) -> ApiResult<CheckoutMode> {
	required_str(&params.success_url, "success_url")?;
	let mode = params.mode.unwrap_or_default();
	match mode {
		CheckoutMode::Payment => payment_mode(params)?,
		CheckoutMode::Setup => setup_mode(params)?,
		CheckoutMode::Subscription => subscription_mode(params)?,
	}
	Ok(mode)
}

fn payment_mode(params: &CreateCheckoutSession) -> ApiResult<()> {
	let items = required_line_items(params)?;
	for (index, item) in items.iter().enumerate() {
		line_item(index, item)?;
	}
	uniform_currency(items)
}

fn setup_mode(params: &CreateCheckoutSession) -> ApiResult<()> {
	match params.line_items.as_deref() {
		Some(items) if !items.is_empty() => Err(ApiError::invalid(
			"line_items",
			"line_items cannot be used in setup mode",
		)),
		_ => Ok(()),
	}
}

fn subscription_mode(params: &CreateCheckoutSession) -> ApiResult<()> {
	let items = required_line_items(params)?;
	for (index, item) in items.iter().enumerate() {
		line_item(index, item)?;
		if item.price.is_none() {
			return Err(ApiError::invalid(
				format!("line_items[{}][price]", index),
				"subscription mode requires a recurring price",
			));
		}
	}
	Ok(())
}

fn required_line_items(params: &CreateCheckoutSession) -> ApiResult<&[LineItemParams]> {
	match params.line_items.as_deref() {
		Some(items) if !items.is_empty() => Ok(items),
		_ => Err(ApiError::missing("line_items")),
	}
}

fn line_item(index: usize, item: &LineItemParams) -> ApiResult<()> {
	match item.quantity {
		None => return Err(ApiError::missing(format!("line_items[{}][quantity]", index))),
		Some(0) => {
			return Err(ApiError::invalid(
				format!("line_items[{}][quantity]", index),
				"must be at least 1",
			));
		}
		Some(_) => {}
	}
	if item.price.is_some() {
		return Ok(());
	}
	let (Some(amount), Some(currency), Some(_)) = (item.amount, &item.currency, &item.name) else {
		return Err(ApiError::invalid(
			format!("line_items[{}]", index),
			"provide `price`, or `amount`, `currency` and `name`",
		));
	};
	if amount < 0 {
		return Err(ApiError::invalid(
			format!("line_items[{}][amount]", index),
			"must be a non-negative integer",
		));
	}
	currency_code(currency, &format!("line_items[{}][currency]", index))
}

// Catalog-priced items are checked once their plans are resolved.
fn uniform_currency(items: &[LineItemParams]) -> ApiResult<()> {
	let mut currencies = items
		.iter()
		.filter(|item| item.price.is_none())
		.filter_map(|item| item.currency.as_deref())
		.map(str::to_ascii_lowercase);
	if let Some(first) = currencies.next() {
		if currencies.any(|currency| currency != first) {
			return Err(ApiError::invalid(
				"line_items",
				"all line items must use the same currency",
			));
		}
	}
	Ok(())
}

/// Validates a product creation request.
pub fn product_create(params: &CreateProduct) -> ApiResult<()> {
	required_str(&params.name, "name")?;
	Ok(())
}

/// Validates a plan creation request.
pub fn plan_create(params: &CreatePlan) -> ApiResult<()> {
	let amount = params.amount.ok_or_else(|| ApiError::missing("amount"))?;
	if amount < 0 {
		return Err(ApiError::invalid("amount", "must be a non-negative integer"));
	}
	currency_code(required_str(&params.currency, "currency")?, "currency")?;
	if params.interval.is_none() {
		return Err(ApiError::missing("interval"));
	}
	if params.interval_count == Some(0) {
		return Err(ApiError::invalid("interval_count", "must be at least 1"));
	}
	if params.trial_period_days.is_some_and(|days| days > MAX_TRIAL_DAYS) {
		return Err(ApiError::invalid(
			"trial_period_days",
			format!("must be at most {} days", MAX_TRIAL_DAYS),
		));
	}
	required_str(&params.product, "product")?;
	Ok(())
}

/// Validates a customer creation request.
pub fn customer_create(params: &CreateCustomer) -> ApiResult<()> {
	if let Some(email) = params.email.as_deref() {
		email_address(email, "email")?;
	}
	Ok(())
}

/// Validates a customer update request.
pub fn customer_update(params: &UpdateCustomer) -> ApiResult<()> {
	if let Some(email) = params.email.as_deref() {
		email_address(email, "email")?;
	}
	Ok(())
}

/// Validates a card token creation request.
pub fn token_create(params: &CreateToken) -> ApiResult<()> {
	match &params.card {
		Some(card) => card_params(card),
		None => Ok(()),
	}
}

/// Validates a payment method creation request.
pub fn payment_method_create(params: &CreatePaymentMethod) -> ApiResult<()> {
	let type_ = params.type_.ok_or_else(|| ApiError::missing("type"))?;
	match (&params.card, type_) {
		(Some(card), PaymentMethodType::Card) => card_params(card),
		(Some(_), _) => Err(ApiError::invalid(
			"card",
			"card details can only be supplied for card payment methods",
		)),
		(None, _) => Ok(()),
	}
}

/// Validates an attach request.
pub fn payment_method_attach(params: &AttachPaymentMethod) -> ApiResult<()> {
	required_str(&params.customer, "customer")?;
	Ok(())
}

/// Validates a payment intent creation request.
pub fn payment_intent_create(params: &CreatePaymentIntent) -> ApiResult<()> {
	let amount = params.amount.ok_or_else(|| ApiError::missing("amount"))?;
	positive_amount(amount)?;
	currency_code(required_str(&params.currency, "currency")?, "currency")
}

/// Validates a payment intent update request.
pub fn payment_intent_update(params: &UpdatePaymentIntent) -> ApiResult<()> {
	match params.amount {
		Some(amount) => positive_amount(amount),
		None => Ok(()),
	}
}

/// Validates a subscription creation request.
///
/// Rule order: `customer`, then `plan` or `items`, then each item.
pub fn subscription_create(params: &CreateSubscription) -> ApiResult<()> {
	required_str(&params.customer, "customer")?;
	if params.plan.is_some() {
		return Ok(());
	}
	let items = match params.items.as_deref() {
		Some(items) if !items.is_empty() => items,
		_ => return Err(ApiError::missing("items")),
	};
	for (index, item) in items.iter().enumerate() {
		required_str(&item.plan, &format!("items[{}][plan]", index))?;
		if item.quantity == Some(0) {
			return Err(ApiError::invalid(
				format!("items[{}][quantity]", index),
				"must be at least 1",
			));
		}
	}
	Ok(())
}

fn card_params(card: &CardParams) -> ApiResult<()> {
	if let Some(number) = card.number.as_deref() {
		let digits = number.chars().filter(|c| !c.is_whitespace());
		if !digits.clone().all(|c| c.is_ascii_digit()) || !(12..=19).contains(&digits.count()) {
			return Err(ApiError::invalid("card[number]", "Your card number is incorrect."));
		}
	}
	if let Some(month) = card.exp_month {
		if !(1..=12).contains(&month) {
			return Err(ApiError::invalid(
				"card[exp_month]",
				"Your card's expiration month is invalid.",
			));
		}
	}
	Ok(())
}

fn positive_amount(amount: i64) -> ApiResult<()> {
	if amount < 1 {
		return Err(ApiError::invalid("amount", "must be a positive integer"));
	}
	Ok(())
}

fn email_address(email: &str, param: &str) -> ApiResult<()> {
	match email.split_once('@') {
		Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
		_ => Err(ApiError::invalid(param, "must be a valid email address")),
	}
}

/// Checks that `value` is a three-letter currency code.
pub fn currency_code(value: &str, param: &str) -> ApiResult<()> {
	if value.len() == 3 && value.chars().all(|c| c.is_ascii_alphabetic()) {
		Ok(())
	} else {
		Err(ApiError::invalid(
			param,
			"must be a three-letter ISO currency code",
		))
	}
}

fn required_str<'a>(value: &'a Option<String>, param: &str) -> ApiResult<&'a str> {
	match value.as_deref() {
		Some(value) if !value.trim().is_empty() => Ok(value),
		_ => Err(ApiError::missing(param)),
	}
}
