//! Products, plans and subscriptions.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Months, Utc};
use paymock_types::params::{CreatePlan, CreateProduct, CreateSubscription, UpdateSubscription};
use paymock_types::{
	ApiError, ApiResult, Customer, Expandable, PaymentMethod, Plan, PlanInterval, Product,
	Resource, ResourceKind, Subscription, SubscriptionItem, SubscriptionStatus, new_id,
};

use super::{MockEngine, claim_id, merge_metadata};
use crate::registry::{RegistryView, WriteSet};
use crate::validation;

impl MockEngine {
	/// Creates a product.
	pub fn create_product(&self, params: CreateProduct) -> ApiResult<Product> {
		validation::product_create(&params)?;
		let product = self.registry.transaction(|view| {
			let product = Product {
				id: claim_id::<Product>(view, params.id)?,
				object: ResourceKind::Product.object_name().to_string(),
				name: params.name.unwrap_or_default(),
				active: true,
				description: params.description,
				metadata: params.metadata.unwrap_or_default(),
				created: Utc::now().timestamp(),
				livemode: self.settings.livemode,
			};
			let mut writes = WriteSet::new();
			writes.put(product.clone());
			Ok((writes, product))
		})?;
		tracing::debug!(product = %product.id, "created product");
		Ok(product)
	}

	/// Creates a plan priced under an existing product.
	///
	/// # Errors
	///
	/// `No such product` (400) when `product` is unknown, `AlreadyExists`
	/// when a caller-chosen id is taken.
	pub fn create_plan(&self, params: CreatePlan) -> ApiResult<Plan> {
		validation::plan_create(&params)?;
		let amount = params.amount.ok_or_else(|| ApiError::missing("amount"))?;
		let interval = params.interval.ok_or_else(|| ApiError::missing("interval"))?;
		let plan = self.registry.transaction(|view| {
			let product_id = params.product.unwrap_or_default();
			let product = view.reference::<Product>("product", &product_id)?;
			let plan = Plan {
				id: claim_id::<Plan>(view, params.id)?,
				object: ResourceKind::Plan.object_name().to_string(),
				amount,
				currency: params.currency.unwrap_or_default().to_ascii_lowercase(),
				interval,
				interval_count: params.interval_count.unwrap_or(1),
				product: Expandable::from(product.id.as_str()),
				active: true,
				nickname: params.nickname,
				trial_period_days: params.trial_period_days.filter(|days| *days > 0),
				created: Utc::now().timestamp(),
				livemode: self.settings.livemode,
			};
			let mut writes = WriteSet::new();
			writes.put(plan.clone());
			Ok((writes, plan))
		})?;
		tracing::debug!(plan = %plan.id, amount = plan.amount, "created plan");
		Ok(plan)
	}

	/// Subscribes an existing customer to one or more plans.
	///
	/// The customer needs a payment source unless the subscription is free or
	/// starts with a trial.
	pub fn create_subscription(&self, params: CreateSubscription) -> ApiResult<Subscription> {
		validation::subscription_create(&params)?;
		let subscription = self.registry.transaction(|view| {
			let customer_id = params.customer.as_deref().unwrap_or_default();
			let customer = view.reference::<Customer>("customer", customer_id)?;
			let items = subscription_plans(view, &params)?;
			let default_payment_method = match params.default_payment_method.as_deref() {
				Some(id) => {
					let method =
						view.reference::<PaymentMethod>("default_payment_method", id)?;
					owned_by(method, customer, "default_payment_method")?;
					Some(id.to_string())
				}
				None => None,
			};

			let subscription = self.new_subscription(
				&customer.id,
				&items,
				default_payment_method,
				params.metadata.unwrap_or_default(),
			)?;
			let has_source = subscription.default_payment_method.is_some()
				|| customer.default_payment_method.is_some()
				|| customer.default_source.is_some();
			let billable = subscription.trial_end.is_none()
				&& items.iter().any(|(plan, _)| plan.amount > 0);
			if billable && !has_source {
				return Err(ApiError::state(
					"customer",
					"This customer has no attached payment source or default payment method.",
				));
			}

			let mut writes = WriteSet::new();
			writes.put(subscription.clone());
			Ok((writes, subscription))
		})?;
		tracing::debug!(
			subscription = %subscription.id,
			customer = %subscription.customer.id(),
			"created subscription"
		);
		Ok(subscription)
	}

	/// Updates cancellation, default payment method or metadata.
	pub fn update_subscription(
		&self,
		id: &str,
		params: UpdateSubscription,
	) -> ApiResult<Subscription> {
		let subscription = self.registry.transaction(|view| {
			let mut subscription = view.get::<Subscription>(id)?.clone();
			if let Some(cancel) = params.cancel_at_period_end {
				subscription.cancel_at_period_end = cancel;
			}
			if let Some(method_id) = params.default_payment_method.as_deref() {
				let method = view.reference::<PaymentMethod>("default_payment_method", method_id)?;
				let customer = view.get::<Customer>(subscription.customer.id())?;
				owned_by(method, customer, "default_payment_method")?;
				subscription.default_payment_method = Some(Expandable::from(method_id));
			}
			merge_metadata(&mut subscription.metadata, params.metadata);

			let mut writes = WriteSet::new();
			writes.put(subscription.clone());
			Ok((writes, subscription))
		})?;
		tracing::debug!(subscription = %subscription.id, "updated subscription");
		Ok(subscription)
	}

	/// Builds (without storing) a subscription for `customer`.
	///
	/// The first plan becomes the subscription's `plan`; its trial, if any,
	/// applies to the whole subscription.
	pub(super) fn new_subscription(
		&self,
		customer: &str,
		items: &[(&Plan, u64)],
		default_payment_method: Option<String>,
		metadata: HashMap<String, String>,
	) -> ApiResult<Subscription> {
		let Some((first, _)) = items.first() else {
			return Err(ApiError::missing("items"));
		};
		let now = Utc::now();
		let trial_end = first.trial_period_days.map(|days| {
			now.checked_add_signed(Duration::days(i64::from(days)))
				.unwrap_or(now)
				.timestamp()
		});
		let current_period_end = match trial_end {
			Some(end) => end,
			None => period_end(now, first.interval, first.interval_count),
		};

		Ok(Subscription {
			id: ResourceKind::Subscription.new_id(),
			object: ResourceKind::Subscription.object_name().to_string(),
			customer: Expandable::from(customer),
			plan: Expandable::from(first.id()),
			items: items
				.iter()
				.map(|(plan, quantity)| SubscriptionItem {
					id: new_id("si"),
					plan: plan.id.clone(),
					quantity: *quantity,
				})
				.collect(),
			status: if trial_end.is_some() {
				SubscriptionStatus::Trialing
			} else {
				SubscriptionStatus::Active
			},
			default_payment_method: default_payment_method.map(Expandable::from),
			current_period_start: now.timestamp(),
			current_period_end,
			trial_end,
			cancel_at_period_end: false,
			metadata,
			created: now.timestamp(),
			livemode: self.settings.livemode,
		})
	}
}

/// Resolves the plans of a subscription request with their quantities.
fn subscription_plans<'v>(
	view: &'v RegistryView<'_>,
	params: &CreateSubscription,
) -> ApiResult<Vec<(&'v Plan, u64)>> {
	if let Some(plan) = params.plan.as_deref() {
		return Ok(vec![(view.reference::<Plan>("plan", plan)?, 1)]);
	}
	let mut plans = Vec::new();
	for (index, item) in params.items.iter().flatten().enumerate() {
		let param = format!("items[{}][plan]", index);
		let plan = view.reference::<Plan>(&param, item.plan.as_deref().unwrap_or_default())?;
		plans.push((plan, item.quantity.unwrap_or(1)));
	}
	compatible_plans(&plans, |index| format!("items[{}][plan]", index))?;
	Ok(plans)
}

/// Checks that every plan bills in the first plan's currency and interval.
pub(super) fn compatible_plans(
	plans: &[(&Plan, u64)],
	param: impl Fn(usize) -> String,
) -> ApiResult<()> {
	let Some((first, _)) = plans.first() else {
		return Ok(());
	};
	for (index, (plan, _)) in plans.iter().enumerate().skip(1) {
		if plan.currency != first.currency {
			return Err(ApiError::invalid(
				param(index),
				format!(
					"currency {} does not match the subscription currency {}",
					plan.currency, first.currency
				),
			));
		}
		if plan.interval != first.interval || plan.interval_count != first.interval_count {
			return Err(ApiError::invalid(
				param(index),
				"all plans on a subscription must share one billing interval",
			));
		}
	}
	Ok(())
}

/// Fails unless `method` is attached to `customer`.
pub(super) fn owned_by(method: &PaymentMethod, customer: &Customer, param: &str) -> ApiResult<()> {
	if method.customer_id() == Some(customer.id.as_str()) {
		Ok(())
	} else {
		Err(ApiError::state(
			param,
			format!(
				"The payment method '{}' must be attached to customer '{}' first.",
				method.id, customer.id
			),
		))
	}
}

fn period_end(start: DateTime<Utc>, interval: PlanInterval, count: u32) -> i64 {
	let end = match interval {
		PlanInterval::Day => start.checked_add_signed(Duration::days(i64::from(count))),
		PlanInterval::Week => start.checked_add_signed(Duration::weeks(i64::from(count))),
		PlanInterval::Month => start.checked_add_months(Months::new(count)),
		PlanInterval::Year => start.checked_add_months(Months::new(count.saturating_mul(12))),
	};
	end.unwrap_or(start).timestamp()
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use paymock_types::params::{CreateCustomer, CreateToken, SubscriptionItemParams};
	use paymock_types::ErrorKind;
	use rstest::{fixture, rstest};

	#[fixture]
	fn engine() -> MockEngine {
		MockEngine::new()
	}

	fn product(engine: &MockEngine) -> Product {
		engine
			.create_product(CreateProduct {
				name: Some("Gold Special".to_string()),
				..Default::default()
			})
			.unwrap()
	}

	fn plan(engine: &MockEngine, interval: PlanInterval, trial: Option<u32>) -> Plan {
		let product = product(engine);
		engine
			.create_plan(CreatePlan {
				amount: Some(1337),
				currency: Some("USD".to_string()),
				interval: Some(interval),
				product: Some(product.id),
				trial_period_days: trial,
				..Default::default()
			})
			.unwrap()
	}

	fn paying_customer(engine: &MockEngine) -> Customer {
		let token = engine.create_token(CreateToken::default()).unwrap();
		engine
			.create_customer(CreateCustomer {
				email: Some("jonny@appleseed.com".to_string()),
				source: Some(token.id),
				..Default::default()
			})
			.unwrap()
	}

	#[rstest]
	fn test_plan_stores_lowercase_currency(engine: MockEngine) {
		let plan = plan(&engine, PlanInterval::Month, None);

		assert_eq!(plan.currency, "usd");
		assert_eq!(plan.interval_count, 1);
		assert!(plan.id.starts_with("plan_"));
	}

	#[rstest]
	fn test_plan_requires_existing_product(engine: MockEngine) {
		let error = engine
			.create_plan(CreatePlan {
				amount: Some(100),
				currency: Some("usd".to_string()),
				interval: Some(PlanInterval::Month),
				product: Some("prod_missing".to_string()),
				..Default::default()
			})
			.unwrap_err();

		assert_eq!(error, ApiError::no_such("product", "prod_missing"));
		assert_eq!(engine.registry().len::<Plan>(), 0);
	}

	#[rstest]
	fn test_caller_chosen_ids_must_be_unique(engine: MockEngine) {
		let params = CreateProduct {
			id: Some("gold".to_string()),
			name: Some("Gold".to_string()),
			..Default::default()
		};
		engine.create_product(params.clone()).unwrap();

		let error = engine.create_product(params).unwrap_err();

		assert_eq!(
			error,
			ApiError::AlreadyExists {
				kind: ResourceKind::Product,
				id: "gold".to_string()
			}
		);
	}

	#[rstest]
	fn test_subscription_for_paying_customer(engine: MockEngine) {
		// Arrange
		let plan = plan(&engine, PlanInterval::Month, None);
		let customer = paying_customer(&engine);

		// Act
		let subscription = engine
			.create_subscription(CreateSubscription {
				customer: Some(customer.id.clone()),
				plan: Some(plan.id.clone()),
				..Default::default()
			})
			.unwrap();

		// Assert
		assert_eq!(subscription.status, SubscriptionStatus::Active);
		assert_eq!(subscription.customer.id(), customer.id);
		assert_eq!(subscription.plan.id(), plan.id);
		assert_eq!(subscription.items.len(), 1);
		assert!(subscription.current_period_end > subscription.current_period_start);
	}

	#[rstest]
	fn test_subscription_without_source_is_rejected(engine: MockEngine) {
		let plan = plan(&engine, PlanInterval::Month, None);
		let customer = engine.create_customer(CreateCustomer::default()).unwrap();

		let error = engine
			.create_subscription(CreateSubscription {
				customer: Some(customer.id),
				plan: Some(plan.id),
				..Default::default()
			})
			.unwrap_err();

		assert_eq!(error.kind(), ErrorKind::State);
		assert_eq!(engine.registry().len::<Subscription>(), 0);
	}

	#[rstest]
	fn test_trial_needs_no_source(engine: MockEngine) {
		let plan = plan(&engine, PlanInterval::Month, Some(14));
		let customer = engine.create_customer(CreateCustomer::default()).unwrap();

		let subscription = engine
			.create_subscription(CreateSubscription {
				customer: Some(customer.id),
				plan: Some(plan.id),
				..Default::default()
			})
			.unwrap();

		assert_eq!(subscription.status, SubscriptionStatus::Trialing);
		assert_eq!(subscription.trial_end, Some(subscription.current_period_end));
		assert_eq!(
			subscription.current_period_end - subscription.current_period_start,
			14 * 24 * 60 * 60
		);
	}

	#[rstest]
	fn test_items_must_share_interval(engine: MockEngine) {
		let monthly = plan(&engine, PlanInterval::Month, None);
		let yearly = plan(&engine, PlanInterval::Year, None);
		let customer = paying_customer(&engine);

		let error = engine
			.create_subscription(CreateSubscription {
				customer: Some(customer.id),
				items: Some(vec![
					SubscriptionItemParams {
						plan: Some(monthly.id),
						quantity: Some(1),
					},
					SubscriptionItemParams {
						plan: Some(yearly.id),
						quantity: Some(1),
					},
				]),
				..Default::default()
			})
			.unwrap_err();

		assert_eq!(error.param(), Some("items[1][plan]"));
	}

	#[rstest]
	fn test_update_subscription_cancel_at_period_end(engine: MockEngine) {
		let plan = plan(&engine, PlanInterval::Week, None);
		let customer = paying_customer(&engine);
		let subscription = engine
			.create_subscription(CreateSubscription {
				customer: Some(customer.id),
				plan: Some(plan.id),
				..Default::default()
			})
			.unwrap();

		let updated = engine
			.update_subscription(
				&subscription.id,
				UpdateSubscription {
					cancel_at_period_end: Some(true),
					..Default::default()
				},
			)
			.unwrap();

		assert!(updated.cancel_at_period_end);
		let stored: Subscription = engine.retrieve(&subscription.id, &[] as &[&str]).unwrap();
		assert_eq!(stored, updated);
	}

	#[rstest]
	#[case(PlanInterval::Day, 3, "2024-01-04T00:00:00Z")]
	#[case(PlanInterval::Week, 2, "2024-01-15T00:00:00Z")]
	#[case(PlanInterval::Month, 1, "2024-02-01T00:00:00Z")]
	#[case(PlanInterval::Year, 1, "2025-01-01T00:00:00Z")]
	fn test_period_end(#[case] interval: PlanInterval, #[case] count: u32, #[case] expected: &str) {
		let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		let expected = DateTime::parse_from_rfc3339(expected).unwrap().timestamp();

		assert_eq!(period_end(start, interval, count), expected);
	}

	#[rstest]
	fn test_month_end_clamps() {
		let start = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
		let expected = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap().timestamp();

		assert_eq!(period_end(start, PlanInterval::Month, 1), expected);
	}
}
