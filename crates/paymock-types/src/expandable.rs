//! References that can be replaced by the object they point at.

use serde::{Deserialize, Serialize};

use crate::resources::Resource;

/// A reference to another resource: a bare id until expanded, the full
/// object afterwards.
///
/// Serialized untagged, so an unexpanded reference is a plain string and an
/// expanded one is a nested object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
	/// Unexpanded id
	Id(String),
	/// Materialized object
	Object(Box<T>),
}

impl<T: Resource> Expandable<T> {
	/// Id of the referenced resource, expanded or not.
	pub fn id(&self) -> &str {
		match self {
			Self::Id(id) => id,
			Self::Object(object) => object.id(),
		}
	}

	/// Returns true when the reference has been expanded.
	pub fn is_object(&self) -> bool {
		matches!(self, Self::Object(_))
	}

	/// Borrows the expanded object.
	pub fn as_object(&self) -> Option<&T> {
		match self {
			Self::Id(_) => None,
			Self::Object(object) => Some(object),
		}
	}

	/// Takes the expanded object.
	pub fn into_object(self) -> Option<T> {
		match self {
			Self::Id(_) => None,
			Self::Object(object) => Some(*object),
		}
	}
}

impl<T> From<String> for Expandable<T> {
	fn from(id: String) -> Self {
		Self::Id(id)
	}
}

impl<T> From<&str> for Expandable<T> {
	fn from(id: &str) -> Self {
		Self::Id(id.to_string())
	}
}
