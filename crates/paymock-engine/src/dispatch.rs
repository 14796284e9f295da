//! Untyped entry point for transport shims.
//!
//! A shim decodes an incoming call into a resource kind, an [`Operation`]
//! and a JSON parameter object, then hands them to [`dispatch`]. The result
//! is the JSON the real service would return; errors render with
//! [`ApiError::to_body`].
//!
//! Two parameters are taken out of the object before decoding:
//!
//! - `id`: the addressed record, required by every operation except
//!   `create` and `list`
//! - `expand`: fields to expand on the returned record, checked before the
//!   operation runs; `complete` answers with ids only and rejects it
//!
//! ```
//! use paymock_engine::dispatch::{Operation, dispatch};
//! use paymock_engine::MockEngine;
//! use paymock_types::ResourceKind;
//! use serde_json::json;
//!
//! let engine = MockEngine::new();
//! let product = dispatch(
//!     &engine,
//!     ResourceKind::Product,
//!     Operation::Create,
//!     json!({ "name": "Gold Special" }),
//! )
//! .unwrap();
//! assert_eq!(product["object"], "product");
//!
//! let error = dispatch(
//!     &engine,
//!     ResourceKind::CheckoutSession,
//!     Operation::Retrieve,
//!     json!({ "id": "nope" }),
//! )
//! .unwrap_err();
//! assert_eq!(error.to_body()["error"]["param"], "checkout_session");
//! ```

use std::fmt;
use std::str::FromStr;

use paymock_types::params::ListParams;
use paymock_types::{
	ApiError, ApiResult, CheckoutSession, Customer, PaymentIntent, PaymentMethod, Plan, Product,
	Resource, ResourceKind, SetupIntent, Subscription, Token,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::engine::MockEngine;
use crate::expand::Expand;

/// Operations a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
	/// Create a record
	Create,
	/// Fetch a record by id
	Retrieve,
	/// Change a record
	Update,
	/// List records
	List,
	/// Attach a payment method to a customer
	Attach,
	/// Confirm a payment intent
	Confirm,
	/// Complete a checkout session
	Complete,
}

impl Operation {
	/// Wire name of the operation.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Create => "create",
			Self::Retrieve => "retrieve",
			Self::Update => "update",
			Self::List => "list",
			Self::Attach => "attach",
			Self::Confirm => "confirm",
			Self::Complete => "complete",
		}
	}
}

impl fmt::Display for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Operation {
	type Err = ApiError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"create" => Ok(Self::Create),
			"retrieve" => Ok(Self::Retrieve),
			"update" => Ok(Self::Update),
			"list" => Ok(Self::List),
			"attach" => Ok(Self::Attach),
			"confirm" => Ok(Self::Confirm),
			"complete" => Ok(Self::Complete),
			other => Err(ApiError::invalid(
				"operation",
				format!("unknown operation '{}'", other),
			)),
		}
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CompleteParams {
	payment_method: Option<String>,
}

// Binds `$alias` to the record type of `$kind` inside `$body`.
macro_rules! for_kind {
	($kind:expr, $alias:ident => $body:expr) => {
		match $kind {
			ResourceKind::Product => {
				type $alias = Product;
				$body
			}
			ResourceKind::Plan => {
				type $alias = Plan;
				$body
			}
			ResourceKind::Customer => {
				type $alias = Customer;
				$body
			}
			ResourceKind::Token => {
				type $alias = Token;
				$body
			}
			ResourceKind::PaymentMethod => {
				type $alias = PaymentMethod;
				$body
			}
			ResourceKind::PaymentIntent => {
				type $alias = PaymentIntent;
				$body
			}
			ResourceKind::SetupIntent => {
				type $alias = SetupIntent;
				$body
			}
			ResourceKind::Subscription => {
				type $alias = Subscription;
				$body
			}
			ResourceKind::CheckoutSession => {
				type $alias = CheckoutSession;
				$body
			}
		}
	};
}

/// Runs one operation with JSON parameters and returns the JSON result.
///
/// `null` parameters are treated as an empty object. `list` returns the
/// real service's list envelope (`object`, `data`, `has_more`, `url`).
///
/// # Errors
///
/// Whatever the operation returns, plus `MalformedParams` when the
/// parameters do not decode and `UnsupportedOperation` for combinations the
/// API does not offer.
pub fn dispatch(
	engine: &MockEngine,
	kind: ResourceKind,
	operation: Operation,
	params: Value,
) -> ApiResult<Value> {
	let mut params = match params {
		Value::Object(map) => map,
		Value::Null => Map::new(),
		_ => {
			return Err(ApiError::MalformedParams {
				reason: "parameters must be a JSON object".to_string(),
			});
		}
	};
	let expand = take_expand(&mut params)?;
	tracing::trace!(kind = %kind, operation = %operation, "dispatching");

	match (kind, operation) {
		(_, Operation::Retrieve) => {
			let id = take_id(&mut params)?;
			for_kind!(kind, R => encode(&engine.retrieve::<R, _>(&id, &expand)?))
		}
		(_, Operation::List) => {
			let filter: ListParams = decode(params)?;
			for_kind!(kind, R => list_envelope(engine, kind, engine.list::<R>(&filter)?, &filter, &expand))
		}
		(ResourceKind::CheckoutSession, Operation::Create) => {
			respond(engine, &expand, || engine.create_checkout_session(decode(params)?))
		}
		(ResourceKind::CheckoutSession, Operation::Complete) => {
			if !expand.is_empty() {
				return Err(ApiError::invalid(
					"expand",
					"complete returns ids only; retrieve the session to expand",
				));
			}
			let id = take_id(&mut params)?;
			let complete: CompleteParams = decode(params)?;
			let payment_method = complete
				.payment_method
				.filter(|id| !id.is_empty())
				.ok_or_else(|| ApiError::missing("payment_method"))?;
			encode(&engine.complete_checkout_session(&id, &payment_method)?)
		}
		(ResourceKind::PaymentIntent, Operation::Create) => {
			respond(engine, &expand, || engine.create_payment_intent(decode(params)?))
		}
		(ResourceKind::PaymentIntent, Operation::Update) => {
			let id = take_id(&mut params)?;
			respond(engine, &expand, || engine.update_payment_intent(&id, decode(params)?))
		}
		(ResourceKind::PaymentIntent, Operation::Confirm) => {
			let id = take_id(&mut params)?;
			respond(engine, &expand, || engine.confirm_payment_intent(&id, decode(params)?))
		}
		(ResourceKind::SetupIntent, Operation::Create) => {
			respond(engine, &expand, || engine.create_setup_intent(decode(params)?))
		}
		(ResourceKind::Subscription, Operation::Create) => {
			respond(engine, &expand, || engine.create_subscription(decode(params)?))
		}
		(ResourceKind::Subscription, Operation::Update) => {
			let id = take_id(&mut params)?;
			respond(engine, &expand, || engine.update_subscription(&id, decode(params)?))
		}
		(ResourceKind::Customer, Operation::Create) => {
			respond(engine, &expand, || engine.create_customer(decode(params)?))
		}
		(ResourceKind::Customer, Operation::Update) => {
			let id = take_id(&mut params)?;
			respond(engine, &expand, || engine.update_customer(&id, decode(params)?))
		}
		(ResourceKind::PaymentMethod, Operation::Create) => {
			respond(engine, &expand, || engine.create_payment_method(decode(params)?))
		}
		(ResourceKind::PaymentMethod, Operation::Attach) => {
			let id = take_id(&mut params)?;
			respond(engine, &expand, || engine.attach_payment_method(&id, decode(params)?))
		}
		(ResourceKind::Token, Operation::Create) => {
			respond(engine, &expand, || engine.create_token(decode(params)?))
		}
		(ResourceKind::Plan, Operation::Create) => {
			respond(engine, &expand, || engine.create_plan(decode(params)?))
		}
		(ResourceKind::Product, Operation::Create) => {
			respond(engine, &expand, || engine.create_product(decode(params)?))
		}
		_ => Err(ApiError::UnsupportedOperation {
			resource: kind.object_name().to_string(),
			operation: operation.to_string(),
		}),
	}
}

// Expansion paths are checked before `operation` runs so a bad path
// leaves the registry untouched.
fn respond<T, F>(engine: &MockEngine, expand: &[String], operation: F) -> ApiResult<Value>
where
	T: Expand,
	F: FnOnce() -> ApiResult<T>,
{
	engine.validate_expand::<T, _>(expand)?;
	let record = operation()?;
	encode(&engine.expand(record, expand)?)
}

fn list_envelope<T: Expand>(
	engine: &MockEngine,
	kind: ResourceKind,
	records: Vec<T>,
	filter: &ListParams,
	expand: &[String],
) -> ApiResult<Value> {
	let limit = filter.limit.unwrap_or(ListParams::DEFAULT_LIMIT);
	let total = engine
		.registry()
		.list::<T>(|record| {
			filter
				.customer
				.as_deref()
				.is_none_or(|id| record.customer_id() == Some(id))
		})
		.len();
	// `expand` on a list addresses fields of each element as `data.{field}`
	let item_paths: Vec<&str> = expand
		.iter()
		.filter_map(|path| path.strip_prefix("data."))
		.collect();
	let data = records
		.into_iter()
		.map(|record| encode(&engine.expand(record, &item_paths)?))
		.collect::<ApiResult<Vec<Value>>>()?;
	Ok(serde_json::json!({
		"object": "list",
		"data": data,
		"has_more": total > limit,
		"url": format!("/v1/{}s", kind.object_name().replace('.', "/")),
	}))
}

fn take_id(params: &mut Map<String, Value>) -> ApiResult<String> {
	match params.remove("id") {
		Some(Value::String(id)) if !id.is_empty() => Ok(id),
		Some(Value::String(_)) | None | Some(Value::Null) => Err(ApiError::missing("id")),
		Some(_) => Err(ApiError::invalid("id", "must be a string")),
	}
}

fn take_expand(params: &mut Map<String, Value>) -> ApiResult<Vec<String>> {
	match params.remove("expand") {
		None | Some(Value::Null) => Ok(Vec::new()),
		Some(value) => serde_json::from_value(value)
			.map_err(|_| ApiError::invalid("expand", "must be an array of strings")),
	}
}

fn decode<T: DeserializeOwned>(params: Map<String, Value>) -> ApiResult<T> {
	serde_json::from_value(Value::Object(params)).map_err(|e| ApiError::MalformedParams {
		reason: e.to_string(),
	})
}

fn encode<T: Serialize>(value: &T) -> ApiResult<Value> {
	serde_json::to_value(value).map_err(|e| ApiError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use paymock_types::ErrorKind;
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn engine() -> MockEngine {
		MockEngine::new()
	}

	#[rstest]
	fn test_operation_round_trips_through_str() {
		for operation in [
			Operation::Create,
			Operation::Retrieve,
			Operation::Update,
			Operation::List,
			Operation::Attach,
			Operation::Confirm,
			Operation::Complete,
		] {
			assert_eq!(operation.as_str().parse::<Operation>().unwrap(), operation);
		}
		assert!("delete".parse::<Operation>().is_err());
	}

	#[rstest]
	fn test_retrieve_requires_id(engine: MockEngine) {
		let error = dispatch(&engine, ResourceKind::Customer, Operation::Retrieve, Value::Null)
			.unwrap_err();

		assert_eq!(error, ApiError::missing("id"));
	}

	#[rstest]
	fn test_wrong_param_type_is_malformed(engine: MockEngine) {
		let error = dispatch(
			&engine,
			ResourceKind::PaymentIntent,
			Operation::Create,
			json!({ "amount": "lots", "currency": "usd" }),
		)
		.unwrap_err();

		assert!(matches!(error, ApiError::MalformedParams { .. }));
		assert_eq!(error.kind(), ErrorKind::InvalidRequest);
	}

	#[rstest]
	fn test_unsupported_combination(engine: MockEngine) {
		let error = dispatch(&engine, ResourceKind::Product, Operation::Complete, json!({}))
			.unwrap_err();

		assert!(matches!(error, ApiError::UnsupportedOperation { .. }));
	}

	#[rstest]
	fn test_list_envelope(engine: MockEngine) {
		for name in ["a", "b", "c"] {
			dispatch(
				&engine,
				ResourceKind::Product,
				Operation::Create,
				json!({ "name": name }),
			)
			.unwrap();
		}

		let page = dispatch(
			&engine,
			ResourceKind::Product,
			Operation::List,
			json!({ "limit": 2 }),
		)
		.unwrap();

		assert_eq!(page["object"], "list");
		assert_eq!(page["data"].as_array().unwrap().len(), 2);
		assert_eq!(page["has_more"], true);
		assert_eq!(page["url"], "/v1/products");
	}

	#[rstest]
	fn test_complete_requires_payment_method(engine: MockEngine) {
		let error = dispatch(
			&engine,
			ResourceKind::CheckoutSession,
			Operation::Complete,
			json!({ "id": "cs_123" }),
		)
		.unwrap_err();

		assert_eq!(error, ApiError::missing("payment_method"));
	}

	#[rstest]
	fn test_create_with_expand(engine: MockEngine) {
		let customer = dispatch(&engine, ResourceKind::Customer, Operation::Create, json!({}))
			.unwrap();

		let intent = dispatch(
			&engine,
			ResourceKind::PaymentIntent,
			Operation::Create,
			json!({
				"amount": 500,
				"currency": "usd",
				"customer": customer["id"],
				"expand": ["customer"],
			}),
		)
		.unwrap();

		assert_eq!(intent["customer"], customer);
	}
}
