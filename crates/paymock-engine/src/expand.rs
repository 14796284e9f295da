//! Reference expansion.
//!
//! `expand` replaces the ids stored in reference fields with the records they
//! point at. Paths may be dotted (`subscription.customer`) to expand inside
//! an expanded object. Expansion is a read-time projection: it works on a
//! copy of the record and never writes to the registry.
//!
//! Under strict expansion every path is first checked against the reference
//! fields of the record types it walks through, so a bad path fails before
//! any record is read. [`MockEngine`](crate::MockEngine) callers that mutate
//! can run the same check up front with [`Resolver::validate_paths`].
//!
//! The ids on the current descent chain, starting with the root record,
//! form the visited set. A reference back into that chain is left as a bare
//! id, which keeps self-referential graphs (a payment method whose customer
//! defaults to that same payment method) finite.

use paymock_types::{
	ApiError, ApiResult, CheckoutSession, Customer, Expandable, PaymentIntent, PaymentMethod,
	Plan, Product, ResourceKind, SetupIntent, Subscription, Token,
};

use crate::registry::{Registry, Stored};
use crate::settings::{EngineSettings, ExpansionPolicy};

/// Resources with expandable reference fields.
pub trait Expand: Stored {
	/// Expands the reference field `field`, continuing with `rest` inside the
	/// expanded object.
	///
	/// Returns `Ok(false)` when the resource has no such field.
	fn expand_field(
		&mut self,
		field: &str,
		rest: Option<&str>,
		resolver: &mut Resolver<'_>,
	) -> ApiResult<bool>;

	/// Kind of record the reference field `field` points at, `None` when the
	/// resource has no such field.
	fn reference(field: &str) -> Option<ResourceKind>;
}

fn reference_of(kind: ResourceKind, field: &str) -> Option<ResourceKind> {
	match kind {
		ResourceKind::Product => Product::reference(field),
		ResourceKind::Plan => Plan::reference(field),
		ResourceKind::Customer => Customer::reference(field),
		ResourceKind::Token => Token::reference(field),
		ResourceKind::PaymentMethod => PaymentMethod::reference(field),
		ResourceKind::PaymentIntent => PaymentIntent::reference(field),
		ResourceKind::SetupIntent => SetupIntent::reference(field),
		ResourceKind::Subscription => Subscription::reference(field),
		ResourceKind::CheckoutSession => CheckoutSession::reference(field),
	}
}

/// Expansion state for a single call.
pub struct Resolver<'a> {
	registry: &'a Registry,
	policy: ExpansionPolicy,
	max_depth: usize,
	chain: Vec<String>,
	path: String,
}

impl<'a> Resolver<'a> {
	/// Creates a resolver reading from `registry`.
	pub fn new(registry: &'a Registry, settings: &EngineSettings) -> Self {
		Self {
			registry,
			policy: settings.expansion,
			max_depth: settings.max_expansion_depth,
			chain: Vec::new(),
			path: String::new(),
		}
	}

	/// Expands each requested path on `record`, in order.
	///
	/// # Errors
	///
	/// Only under [`ExpansionPolicy::Strict`]: [`ApiError::CannotExpand`] for
	/// an unknown field or a path deeper than the configured limit.
	pub fn expand<T, S>(&mut self, mut record: T, paths: &[S]) -> ApiResult<T>
	where
		T: Expand,
		S: AsRef<str>,
	{
		self.validate_paths::<T, S>(paths)?;
		for path in paths {
			let path = path.as_ref();
			if path.is_empty() {
				continue;
			}
			self.path = path.to_string();
			self.chain.clear();
			self.chain.push(record.id().to_string());
			self.expand_path(&mut record, path)?;
		}
		Ok(record)
	}

	/// Checks `paths` against the reference fields of `T` and the depth
	/// limit without reading any record.
	///
	/// # Errors
	///
	/// Only under [`ExpansionPolicy::Strict`]: [`ApiError::CannotExpand`] for
	/// the first path naming a field that is not a reference on the type it
	/// addresses, or having more segments than the depth limit.
	pub fn validate_paths<T, S>(&self, paths: &[S]) -> ApiResult<()>
	where
		T: Expand,
		S: AsRef<str>,
	{
		if self.policy == ExpansionPolicy::Permissive {
			return Ok(());
		}
		for path in paths.iter().map(AsRef::as_ref).filter(|path| !path.is_empty()) {
			let mut kind = T::KIND;
			for (depth, field) in path.split('.').enumerate() {
				kind = match reference_of(kind, field) {
					Some(next) if depth < self.max_depth => next,
					_ => {
						return Err(ApiError::CannotExpand {
							path: path.to_string(),
						});
					}
				};
			}
		}
		Ok(())
	}

	fn expand_path<T: Expand>(&mut self, record: &mut T, path: &str) -> ApiResult<()> {
		if self.chain.len() > self.max_depth {
			return self.unexpandable("too deep");
		}
		let (field, rest) = match path.split_once('.') {
			Some((field, rest)) => (field, Some(rest)),
			None => (path, None),
		};
		if record.expand_field(field, rest, self)? {
			Ok(())
		} else {
			self.unexpandable("unknown field")
		}
	}

	/// Expands an optional reference slot. `None` is a known but empty field.
	pub fn resolve_opt<T: Expand>(
		&mut self,
		slot: &mut Option<Expandable<T>>,
		rest: Option<&str>,
	) -> ApiResult<()> {
		match slot {
			Some(slot) => self.resolve(slot, rest),
			None => Ok(()),
		}
	}

	/// Expands a reference slot in place.
	pub fn resolve<T: Expand>(
		&mut self,
		slot: &mut Expandable<T>,
		rest: Option<&str>,
	) -> ApiResult<()> {
		let id = match slot {
			Expandable::Object(object) => {
				return match rest {
					Some(rest) => self.descend(object.as_mut(), rest),
					None => Ok(()),
				};
			}
			Expandable::Id(id) => id.clone(),
		};
		if self.chain.contains(&id) {
			tracing::trace!(path = %self.path, id = %id, "expansion cycle, keeping bare id");
			return Ok(());
		}
		let Some(mut object) = self.registry.find::<T>(&id) else {
			tracing::trace!(path = %self.path, id = %id, "dangling reference, keeping bare id");
			return Ok(());
		};
		if let Some(rest) = rest {
			self.descend(&mut object, rest)?;
		}
		*slot = Expandable::Object(Box::new(object));
		Ok(())
	}

	fn descend<T: Expand>(&mut self, object: &mut T, rest: &str) -> ApiResult<()> {
		self.chain.push(object.id().to_string());
		let result = self.expand_path(object, rest);
		self.chain.pop();
		result
	}

	fn unexpandable(&self, reason: &str) -> ApiResult<()> {
		match self.policy {
			ExpansionPolicy::Strict => Err(ApiError::CannotExpand {
				path: self.path.clone(),
			}),
			ExpansionPolicy::Permissive => {
				tracing::trace!(path = %self.path, reason, "ignoring unexpandable path");
				Ok(())
			}
		}
	}
}

impl Expand for CheckoutSession {
	fn expand_field(
		&mut self,
		field: &str,
		rest: Option<&str>,
		resolver: &mut Resolver<'_>,
	) -> ApiResult<bool> {
		match field {
			"customer" => resolver.resolve_opt(&mut self.customer, rest)?,
			"payment_intent" => resolver.resolve_opt(&mut self.payment_intent, rest)?,
			"setup_intent" => resolver.resolve_opt(&mut self.setup_intent, rest)?,
			"subscription" => resolver.resolve_opt(&mut self.subscription, rest)?,
			"payment_method" => resolver.resolve_opt(&mut self.payment_method, rest)?,
			_ => return Ok(false),
		}
		Ok(true)
	}

	fn reference(field: &str) -> Option<ResourceKind> {
		match field {
			"customer" => Some(ResourceKind::Customer),
			"payment_intent" => Some(ResourceKind::PaymentIntent),
			"setup_intent" => Some(ResourceKind::SetupIntent),
			"subscription" => Some(ResourceKind::Subscription),
			"payment_method" => Some(ResourceKind::PaymentMethod),
			_ => None,
		}
	}
}

impl Expand for PaymentIntent {
	fn expand_field(
		&mut self,
		field: &str,
		rest: Option<&str>,
		resolver: &mut Resolver<'_>,
	) -> ApiResult<bool> {
		match field {
			"customer" => resolver.resolve_opt(&mut self.customer, rest)?,
			"payment_method" => resolver.resolve_opt(&mut self.payment_method, rest)?,
			_ => return Ok(false),
		}
		Ok(true)
	}

	fn reference(field: &str) -> Option<ResourceKind> {
		match field {
			"customer" => Some(ResourceKind::Customer),
			"payment_method" => Some(ResourceKind::PaymentMethod),
			_ => None,
		}
	}
}

impl Expand for SetupIntent {
	fn expand_field(
		&mut self,
		field: &str,
		rest: Option<&str>,
		resolver: &mut Resolver<'_>,
	) -> ApiResult<bool> {
		match field {
			"customer" => resolver.resolve_opt(&mut self.customer, rest)?,
			"payment_method" => resolver.resolve_opt(&mut self.payment_method, rest)?,
			_ => return Ok(false),
		}
		Ok(true)
	}

	fn reference(field: &str) -> Option<ResourceKind> {
		match field {
			"customer" => Some(ResourceKind::Customer),
			"payment_method" => Some(ResourceKind::PaymentMethod),
			_ => None,
		}
	}
}

impl Expand for Subscription {
	fn expand_field(
		&mut self,
		field: &str,
		rest: Option<&str>,
		resolver: &mut Resolver<'_>,
	) -> ApiResult<bool> {
		match field {
			"customer" => resolver.resolve(&mut self.customer, rest)?,
			"plan" => resolver.resolve(&mut self.plan, rest)?,
			"default_payment_method" => {
				resolver.resolve_opt(&mut self.default_payment_method, rest)?
			}
			_ => return Ok(false),
		}
		Ok(true)
	}

	fn reference(field: &str) -> Option<ResourceKind> {
		match field {
			"customer" => Some(ResourceKind::Customer),
			"plan" => Some(ResourceKind::Plan),
			"default_payment_method" => Some(ResourceKind::PaymentMethod),
			_ => None,
		}
	}
}

impl Expand for Customer {
	fn expand_field(
		&mut self,
		field: &str,
		rest: Option<&str>,
		resolver: &mut Resolver<'_>,
	) -> ApiResult<bool> {
		match field {
			"default_payment_method" => {
				resolver.resolve_opt(&mut self.default_payment_method, rest)?
			}
			_ => return Ok(false),
		}
		Ok(true)
	}

	fn reference(field: &str) -> Option<ResourceKind> {
		match field {
			"default_payment_method" => Some(ResourceKind::PaymentMethod),
			_ => None,
		}
	}
}

impl Expand for PaymentMethod {
	fn expand_field(
		&mut self,
		field: &str,
		rest: Option<&str>,
		resolver: &mut Resolver<'_>,
	) -> ApiResult<bool> {
		match field {
			"customer" => resolver.resolve_opt(&mut self.customer, rest)?,
			_ => return Ok(false),
		}
		Ok(true)
	}

	fn reference(field: &str) -> Option<ResourceKind> {
		match field {
			"customer" => Some(ResourceKind::Customer),
			_ => None,
		}
	}
}

impl Expand for Plan {
	fn expand_field(
		&mut self,
		field: &str,
		rest: Option<&str>,
		resolver: &mut Resolver<'_>,
	) -> ApiResult<bool> {
		match field {
			"product" => resolver.resolve(&mut self.product, rest)?,
			_ => return Ok(false),
		}
		Ok(true)
	}

	fn reference(field: &str) -> Option<ResourceKind> {
		match field {
			"product" => Some(ResourceKind::Product),
			_ => None,
		}
	}
}

impl Expand for Product {
	fn expand_field(&mut self, _: &str, _: Option<&str>, _: &mut Resolver<'_>) -> ApiResult<bool> {
		Ok(false)
	}

	fn reference(_: &str) -> Option<ResourceKind> {
		None
	}
}

impl Expand for Token {
	fn expand_field(&mut self, _: &str, _: Option<&str>, _: &mut Resolver<'_>) -> ApiResult<bool> {
		Ok(false)
	}

	fn reference(_: &str) -> Option<ResourceKind> {
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use paymock_types::PaymentMethodType;
	use rstest::{fixture, rstest};

	fn customer(id: &str, default_payment_method: Option<&str>) -> Customer {
		Customer {
			id: id.to_string(),
			object: "customer".to_string(),
			email: Some("jonny@appleseed.com".to_string()),
			name: None,
			default_source: None,
			default_payment_method: default_payment_method.map(Expandable::from),
			metadata: Default::default(),
			created: 0,
			livemode: false,
		}
	}

	fn payment_method(id: &str, customer: Option<&str>) -> PaymentMethod {
		PaymentMethod {
			id: id.to_string(),
			object: "payment_method".to_string(),
			type_: PaymentMethodType::Card,
			card: None,
			customer: customer.map(Expandable::from),
			created: 0,
			livemode: false,
		}
	}

	/// A customer and payment method that reference each other.
	#[fixture]
	fn cyclic() -> Registry {
		let registry = Registry::new();
		registry.put(customer("cus_1", Some("pm_1")));
		registry.put(payment_method("pm_1", Some("cus_1")));
		registry
	}

	#[rstest]
	fn test_expands_single_field(cyclic: Registry) {
		let settings = EngineSettings::default();
		let record = cyclic.get::<PaymentMethod>("pm_1").unwrap();

		let expanded = Resolver::new(&cyclic, &settings)
			.expand(record, &["customer"])
			.unwrap();

		let customer = expanded.customer.unwrap().into_object().unwrap();
		assert_eq!(customer, cyclic.get::<Customer>("cus_1").unwrap());
	}

	#[rstest]
	fn test_cycle_back_to_root_stays_bare(cyclic: Registry) {
		let settings = EngineSettings::default();
		let record = cyclic.get::<PaymentMethod>("pm_1").unwrap();

		let expanded = Resolver::new(&cyclic, &settings)
			.expand(record, &["customer.default_payment_method"])
			.unwrap();

		let customer = expanded.customer.unwrap().into_object().unwrap();
		assert_eq!(
			customer.default_payment_method,
			Some(Expandable::Id("pm_1".to_string()))
		);
	}

	#[rstest]
	fn test_unknown_field_ignored_when_permissive(cyclic: Registry) {
		let settings = EngineSettings::default();
		let record = cyclic.get::<Customer>("cus_1").unwrap();

		let expanded = Resolver::new(&cyclic, &settings)
			.expand(record.clone(), &["nonsense", "email"])
			.unwrap();

		assert_eq!(expanded, record);
	}

	#[rstest]
	fn test_unknown_field_rejected_when_strict(cyclic: Registry) {
		let settings = EngineSettings::default().with_expansion(ExpansionPolicy::Strict);
		let record = cyclic.get::<Customer>("cus_1").unwrap();

		let error = Resolver::new(&cyclic, &settings)
			.expand(record, &["default_payment_method.nonsense"])
			.unwrap_err();

		assert_eq!(
			error,
			ApiError::CannotExpand {
				path: "default_payment_method.nonsense".to_string()
			}
		);
		assert_eq!(error.param(), Some("expand"));
	}

	#[rstest]
	fn test_depth_limit_truncates_when_permissive(cyclic: Registry) {
		let settings = EngineSettings::default().with_max_expansion_depth(1);
		let record = cyclic.get::<Customer>("cus_1").unwrap();

		let expanded = Resolver::new(&cyclic, &settings)
			.expand(record, &["default_payment_method.customer"])
			.unwrap();

		let method = expanded.default_payment_method.unwrap().into_object().unwrap();
		assert!(!method.customer.unwrap().is_object());
	}

	#[rstest]
	fn test_depth_limit_rejected_when_strict(cyclic: Registry) {
		let settings = EngineSettings::default()
			.with_max_expansion_depth(1)
			.with_expansion(ExpansionPolicy::Strict);
		let record = cyclic.get::<Customer>("cus_1").unwrap();

		let result = Resolver::new(&cyclic, &settings)
			.expand(record, &["default_payment_method.customer"]);

		assert!(matches!(result, Err(ApiError::CannotExpand { .. })));
	}

	#[rstest]
	#[case::unknown_root("nonsense")]
	#[case::unknown_nested("default_payment_method.nonsense")]
	#[case::scalar_field("email")]
	#[case::trailing_dot("default_payment_method.")]
	#[case::too_deep("default_payment_method.customer.default_payment_method.customer.default_payment_method")]
	fn test_validate_paths_rejects_when_strict(#[case] path: &str) {
		let registry = Registry::new();
		let settings = EngineSettings::default().with_expansion(ExpansionPolicy::Strict);

		let result = Resolver::new(&registry, &settings).validate_paths::<Customer, _>(&[path]);

		assert_eq!(
			result,
			Err(ApiError::CannotExpand {
				path: path.to_string()
			})
		);
	}

	#[rstest]
	fn test_validate_paths_needs_no_records() {
		let registry = Registry::new();
		let settings = EngineSettings::default().with_expansion(ExpansionPolicy::Strict);
		let resolver = Resolver::new(&registry, &settings);

		let result = resolver.validate_paths::<CheckoutSession, _>(&[
			"",
			"subscription.plan.product",
			"payment_intent.payment_method.customer",
		]);

		assert_eq!(result, Ok(()));
	}

	#[rstest]
	fn test_validate_paths_accepts_anything_when_permissive() {
		let registry = Registry::new();
		let settings = EngineSettings::default();

		let result = Resolver::new(&registry, &settings).validate_paths::<Token, _>(&["nonsense"]);

		assert_eq!(result, Ok(()));
	}

	#[rstest]
	fn test_strict_rejects_path_through_empty_reference() {
		let registry = Registry::new();
		registry.put(customer("cus_2", None));
		let settings = EngineSettings::default().with_expansion(ExpansionPolicy::Strict);
		let record = registry.get::<Customer>("cus_2").unwrap();

		let result = Resolver::new(&registry, &settings)
			.expand(record, &["default_payment_method.nonsense"]);

		assert!(matches!(result, Err(ApiError::CannotExpand { .. })));
	}

	#[rstest]
	fn test_dangling_reference_stays_bare() {
		let registry = Registry::new();
		registry.put(payment_method("pm_1", Some("cus_gone")));
		let settings = EngineSettings::default();
		let record = registry.get::<PaymentMethod>("pm_1").unwrap();

		let expanded = Resolver::new(&registry, &settings)
			.expand(record, &["customer"])
			.unwrap();

		assert_eq!(expanded.customer, Some(Expandable::Id("cus_gone".to_string())));
	}

	#[rstest]
	fn test_expansion_is_idempotent(cyclic: Registry) {
		let settings = EngineSettings::default();
		let record = cyclic.get::<PaymentMethod>("pm_1").unwrap();
		let mut resolver = Resolver::new(&cyclic, &settings);

		let once = resolver.expand(record, &["customer"]).unwrap();
		let twice = resolver.expand(once.clone(), &["customer", "customer"]).unwrap();

		assert_eq!(once, twice);
	}

	#[rstest]
	fn test_expansion_does_not_write(cyclic: Registry) {
		let settings = EngineSettings::default();
		let record = cyclic.get::<PaymentMethod>("pm_1").unwrap();

		Resolver::new(&cyclic, &settings)
			.expand(record, &["customer"])
			.unwrap();

		let stored = cyclic.get::<PaymentMethod>("pm_1").unwrap();
		assert!(!stored.customer.unwrap().is_object());
	}
}
