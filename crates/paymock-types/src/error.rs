//! Error taxonomy of the mocked payment API.
//!
//! Every failure carries the four things a caller of the real service can
//! observe: a kind, a human-readable message, the offending parameter and an
//! HTTP status. Messages follow fixed templates so tests can match on the
//! structured fields instead of string patterns.

use http::StatusCode;
use serde_json::{Value, json};
use thiserror::Error;

use crate::id::ResourceKind;

/// Broad classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// A required parameter is missing, malformed or references nothing.
	InvalidRequest,
	/// The addressed resource does not exist.
	NotFound,
	/// The operation is not valid for the resource's current state.
	State,
	/// The engine failed to encode its own output.
	Api,
}

/// Payment API errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
	/// Required parameter absent or empty
	#[error("Missing required param: {param}.")]
	MissingParam {
		/// Parameter name, e.g. `line_items` or `line_items[0][quantity]`
		param: String,
	},

	/// Parameter present but unacceptable
	#[error("Invalid {param}: {reason}")]
	InvalidParam {
		/// Parameter name
		param: String,
		/// What is wrong with it
		reason: String,
	},

	/// Parameter names an id that does not exist
	#[error("No such {param}: '{id}'")]
	NoSuchReference {
		/// Referencing parameter, e.g. `customer`
		param: String,
		/// The dangling id
		id: String,
	},

	/// Addressed resource does not exist
	#[error("No such {kind}: '{id}'")]
	NotFound {
		/// Kind of the missing resource
		kind: ResourceKind,
		/// Requested id
		id: String,
	},

	/// Caller-supplied id is already taken
	#[error("{} already exists: '{id}'", kind.param_name())]
	AlreadyExists {
		/// Kind of the clashing resource
		kind: ResourceKind,
		/// Clashing id
		id: String,
	},

	/// Operation not allowed in the resource's current state
	#[error("{message}")]
	InvalidState {
		/// Parameter identifying the resource in the wrong state
		param: String,
		/// Explanation
		message: String,
	},

	/// Requested expansion path is not expandable
	#[error("This property cannot be expanded ({path}).")]
	CannotExpand {
		/// Full dotted path as requested
		path: String,
	},

	/// Request body could not be decoded
	#[error("Invalid request: {reason}")]
	MalformedParams {
		/// Decoder message
		reason: String,
	},

	/// Operation not offered for the resource
	#[error("Unrecognized request: {operation} is not supported for {resource}")]
	UnsupportedOperation {
		/// Resource addressed
		resource: String,
		/// Operation requested
		operation: String,
	},

	/// Response encoding failed
	#[error("Failed to encode response: {0}")]
	Encoding(String),
}

/// Result type alias for payment API operations.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
	/// `Missing required param: {param}.`
	pub fn missing(param: impl Into<String>) -> Self {
		Self::MissingParam {
			param: param.into(),
		}
	}

	/// `Invalid {param}: {reason}`
	pub fn invalid(param: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::InvalidParam {
			param: param.into(),
			reason: reason.into(),
		}
	}

	/// `No such {param}: '{id}'`, reported with status 400.
	pub fn no_such(param: impl Into<String>, id: impl Into<String>) -> Self {
		Self::NoSuchReference {
			param: param.into(),
			id: id.into(),
		}
	}

	/// `No such {kind}: '{id}'`, reported with status 404.
	pub fn not_found(kind: ResourceKind, id: impl Into<String>) -> Self {
		Self::NotFound {
			kind,
			id: id.into(),
		}
	}

	/// Operation rejected because of the resource's state.
	pub fn state(param: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidState {
			param: param.into(),
			message: message.into(),
		}
	}

	/// Classification of this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::NotFound { .. } => ErrorKind::NotFound,
			Self::InvalidState { .. } => ErrorKind::State,
			Self::Encoding(_) => ErrorKind::Api,
			Self::MissingParam { .. }
			| Self::InvalidParam { .. }
			| Self::NoSuchReference { .. }
			| Self::AlreadyExists { .. }
			| Self::CannotExpand { .. }
			| Self::MalformedParams { .. }
			| Self::UnsupportedOperation { .. } => ErrorKind::InvalidRequest,
		}
	}

	/// Name of the offending parameter, when there is one.
	pub fn param(&self) -> Option<&str> {
		match self {
			Self::MissingParam { param }
			| Self::InvalidParam { param, .. }
			| Self::NoSuchReference { param, .. }
			| Self::InvalidState { param, .. } => Some(param),
			Self::NotFound { kind, .. } => Some(kind.param_name()),
			Self::AlreadyExists { .. } => Some("id"),
			Self::CannotExpand { .. } => Some("expand"),
			Self::MalformedParams { .. }
			| Self::UnsupportedOperation { .. }
			| Self::Encoding(_) => None,
		}
	}

	/// HTTP status the real service answers with.
	pub fn http_status(&self) -> StatusCode {
		match self.kind() {
			ErrorKind::NotFound => StatusCode::NOT_FOUND,
			ErrorKind::InvalidRequest | ErrorKind::State => StatusCode::BAD_REQUEST,
			ErrorKind::Api => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Value of the `type` field in the error envelope.
	pub fn error_type(&self) -> &'static str {
		match self.kind() {
			ErrorKind::Api => "api_error",
			_ => "invalid_request_error",
		}
	}

	/// Machine-readable error code, when the real service sends one.
	pub fn code(&self) -> Option<&'static str> {
		match self {
			Self::MissingParam { .. } => Some("parameter_missing"),
			Self::InvalidParam { .. } => Some("parameter_invalid"),
			Self::NoSuchReference { .. } | Self::NotFound { .. } => Some("resource_missing"),
			Self::AlreadyExists { .. } => Some("resource_already_exists"),
			Self::InvalidState { .. } => Some("resource_state_invalid"),
			_ => None,
		}
	}

	/// Renders the `{"error": {...}}` envelope a transport shim would send.
	pub fn to_body(&self) -> Value {
		json!({
			"error": {
				"type": self.error_type(),
				"message": self.to_string(),
				"param": self.param(),
				"code": self.code(),
			}
		})
	}
}
