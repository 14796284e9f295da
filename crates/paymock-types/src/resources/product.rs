use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Resource;
use crate::id::ResourceKind;

/// Catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
	/// Unique identifier
	pub id: String,
	/// Always `product`
	pub object: String,
	/// Display name
	pub name: String,
	/// Whether the product is for sale
	pub active: bool,
	/// Long description
	pub description: Option<String>,
	/// Custom metadata
	pub metadata: HashMap<String, String>,
	/// Creation timestamp (unix seconds)
	pub created: i64,
	/// Live or test mode
	pub livemode: bool,
}

impl Resource for Product {
	const KIND: ResourceKind = ResourceKind::Product;

	fn id(&self) -> &str {
		&self.id
	}
}
