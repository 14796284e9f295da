//! The transition engine.
//!
//! [`MockEngine`] owns a [`Registry`] and implements every operation of the
//! mocked API on top of it: validation first, then a single registry
//! transaction holding all the writes of the operation, then expansion of
//! the result. An operation either returns a complete result or exactly one
//! [`ApiError`] with nothing committed.
//!
//! Operations are grouped by area:
//!
//! - catalog and subscriptions in `billing`
//! - customers, card tokens and payment methods in `customers`
//! - payment and setup intents in `intents`
//! - checkout sessions and their completion in `checkout`

use std::collections::HashMap;

use paymock_types::params::ListParams;
use paymock_types::{ApiError, ApiResult};

use crate::expand::{Expand, Resolver};
use crate::registry::{Registry, RegistryView, Stored};
use crate::settings::{EngineSettings, SettingsResult};

mod billing;
mod checkout;
mod customers;
mod intents;

pub use checkout::Completion;

/// Stateful stand-in for the remote payment API.
///
/// The engine is `Send + Sync`; share it between test workers with an
/// `Arc`. Every engine owns its own registry, so tests holding separate
/// engines never observe each other's records.
///
/// # Examples
///
/// ```
/// use paymock_engine::MockEngine;
/// use paymock_types::params::CreateProduct;
/// use paymock_types::Product;
///
/// let engine = MockEngine::new();
/// let product = engine
///     .create_product(CreateProduct {
///         name: Some("Gold".to_string()),
///         ..Default::default()
///     })
///     .unwrap();
///
/// let fetched: Product = engine.retrieve(&product.id, &[] as &[&str]).unwrap();
/// assert_eq!(fetched, product);
/// ```
#[derive(Debug, Default)]
pub struct MockEngine {
	registry: Registry,
	settings: EngineSettings,
}

impl MockEngine {
	/// Creates an engine with default settings and an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an engine with custom settings.
	///
	/// # Errors
	///
	/// Returns the first invalid setting.
	pub fn with_settings(settings: EngineSettings) -> SettingsResult<Self> {
		settings.validate()?;
		Ok(Self {
			registry: Registry::new(),
			settings,
		})
	}

	/// The underlying store.
	pub fn registry(&self) -> &Registry {
		&self.registry
	}

	/// Active settings.
	pub fn settings(&self) -> &EngineSettings {
		&self.settings
	}

	/// Forgets every record.
	pub fn reset(&self) {
		self.registry.clear();
		tracing::debug!("registry cleared");
	}

	/// Expands reference fields of `record` against the current registry.
	pub fn expand<T, S>(&self, record: T, fields: &[S]) -> ApiResult<T>
	where
		T: Expand,
		S: AsRef<str>,
	{
		Resolver::new(&self.registry, &self.settings).expand(record, fields)
	}

	/// Checks expansion paths for a `T` before anything is written.
	///
	/// # Errors
	///
	/// [`ApiError::CannotExpand`] under strict expansion.
	pub fn validate_expand<T, S>(&self, fields: &[S]) -> ApiResult<()>
	where
		T: Expand,
		S: AsRef<str>,
	{
		Resolver::new(&self.registry, &self.settings).validate_paths::<T, S>(fields)
	}

	/// Retrieves a record of any kind and expands the requested fields.
	///
	/// # Errors
	///
	/// [`ApiError::NotFound`] naming the resource kind when the id is unknown,
	/// or [`ApiError::CannotExpand`] under strict expansion.
	pub fn retrieve<T, S>(&self, id: &str, expand: &[S]) -> ApiResult<T>
	where
		T: Expand,
		S: AsRef<str>,
	{
		let record = self.registry.get::<T>(id)?;
		self.expand(record, expand)
	}

	/// Lists records of one kind in creation order.
	///
	/// `customer` keeps only records belonging to that customer; `limit`
	/// defaults to [`ListParams::DEFAULT_LIMIT`].
	pub fn list<T: Stored>(&self, params: &ListParams) -> ApiResult<Vec<T>> {
		let limit = match params.limit {
			None => ListParams::DEFAULT_LIMIT,
			Some(limit) if (1..=ListParams::MAX_LIMIT).contains(&limit) => limit,
			Some(_) => {
				return Err(ApiError::invalid(
					"limit",
					format!("must be between 1 and {}", ListParams::MAX_LIMIT),
				));
			}
		};
		let customer = params.customer.as_deref();
		let mut records = self
			.registry
			.list::<T>(|record| customer.is_none_or(|id| record.customer_id() == Some(id)));
		records.truncate(limit);
		Ok(records)
	}

	fn payment_method_types(&self, requested: Option<Vec<String>>) -> Vec<String> {
		requested
			.filter(|types| !types.is_empty())
			.unwrap_or_else(|| self.settings.default_payment_method_types.clone())
	}
}

/// Accepts a caller-chosen id if it is free, otherwise generates one.
fn claim_id<T: Stored>(view: &RegistryView<'_>, requested: Option<String>) -> ApiResult<String> {
	match requested.filter(|id| !id.trim().is_empty()) {
		Some(id) if view.contains::<T>(&id) => Err(ApiError::AlreadyExists { kind: T::KIND, id }),
		Some(id) => Ok(id),
		None => Ok(T::KIND.new_id()),
	}
}

fn merge_metadata(target: &mut HashMap<String, String>, update: Option<HashMap<String, String>>) {
	for (key, value) in update.unwrap_or_default() {
		// An empty value unsets the key
		if value.is_empty() {
			target.remove(&key);
		} else {
			target.insert(key, value);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::settings::ExpansionPolicy;
	use paymock_types::params::{CreateCustomer, CreateProduct};
	use paymock_types::{Customer, ErrorKind, Product};
	use rstest::{fixture, rstest};

	#[fixture]
	fn engine() -> MockEngine {
		MockEngine::new()
	}

	fn customer(engine: &MockEngine, email: &str) -> Customer {
		engine
			.create_customer(CreateCustomer {
				email: Some(email.to_string()),
				..Default::default()
			})
			.unwrap()
	}

	#[rstest]
	fn test_with_settings_validates() {
		let settings = EngineSettings::default().with_max_expansion_depth(0);
		assert!(MockEngine::with_settings(settings).is_err());

		let settings = EngineSettings::default().with_expansion(ExpansionPolicy::Strict);
		let engine = MockEngine::with_settings(settings).unwrap();
		assert_eq!(engine.settings().expansion, ExpansionPolicy::Strict);
	}

	#[rstest]
	fn test_retrieve_unknown_is_not_found(engine: MockEngine) {
		let error = engine.retrieve::<Product, &str>("prod_nope", &[]).unwrap_err();

		assert_eq!(error.kind(), ErrorKind::NotFound);
		assert_eq!(error.param(), Some("product"));
		assert_eq!(error.http_status().as_u16(), 404);
	}

	#[rstest]
	fn test_list_filters_by_customer_and_limits(engine: MockEngine) {
		// Arrange
		let first = customer(&engine, "a@example.com");
		customer(&engine, "b@example.com");
		customer(&engine, "c@example.com");

		// Act
		let all = engine.list::<Customer>(&ListParams::default()).unwrap();
		let one = engine
			.list::<Customer>(&ListParams {
				customer: Some(first.id.clone()),
				..Default::default()
			})
			.unwrap();
		let limited = engine
			.list::<Customer>(&ListParams {
				limit: Some(2),
				..Default::default()
			})
			.unwrap();

		// Assert
		assert_eq!(all.len(), 3);
		assert_eq!(all[0].id, first.id);
		assert_eq!(one, vec![first]);
		assert_eq!(limited.len(), 2);
	}

	#[rstest]
	#[case(0)]
	#[case(101)]
	fn test_list_limit_out_of_range(engine: MockEngine, #[case] limit: usize) {
		let error = engine
			.list::<Product>(&ListParams {
				limit: Some(limit),
				..Default::default()
			})
			.unwrap_err();
		assert_eq!(error.param(), Some("limit"));
	}

	#[rstest]
	fn test_reset_forgets_records(engine: MockEngine) {
		engine
			.create_product(CreateProduct {
				name: Some("Gold".to_string()),
				..Default::default()
			})
			.unwrap();

		engine.reset();

		assert_eq!(engine.registry().len::<Product>(), 0);
	}

	#[rstest]
	fn test_merge_metadata_unsets_empty_values() {
		let mut metadata = HashMap::from([
			("keep".to_string(), "1".to_string()),
			("drop".to_string(), "2".to_string()),
		]);

		merge_metadata(
			&mut metadata,
			Some(HashMap::from([
				("drop".to_string(), String::new()),
				("new".to_string(), "3".to_string()),
			])),
		);

		assert_eq!(metadata.len(), 2);
		assert_eq!(metadata["keep"], "1");
		assert_eq!(metadata["new"], "3");
	}
}
