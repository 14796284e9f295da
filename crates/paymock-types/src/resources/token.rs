use serde::{Deserialize, Serialize};

use super::{CardDetails, Resource};
use crate::id::ResourceKind;

/// Card carried by a token; becomes a customer's source when consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCard {
	/// Card source id (`card_...`)
	pub id: String,
	/// Card details
	#[serde(flatten)]
	pub details: CardDetails,
}

/// Single-use card token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
	/// Unique identifier
	pub id: String,
	/// Always `token`
	pub object: String,
	/// Tokenized card
	pub card: TokenCard,
	/// Whether the token has been consumed
	pub used: bool,
	/// Creation timestamp (unix seconds)
	pub created: i64,
	/// Live or test mode
	pub livemode: bool,
}

impl Resource for Token {
	const KIND: ResourceKind = ResourceKind::Token;

	fn id(&self) -> &str {
		&self.id
	}
}
