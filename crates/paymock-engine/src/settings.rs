//! Engine configuration.
//!
//! Settings are plain serde data with sensible defaults, so a test suite can
//! either build them in code or load them from a TOML fragment:
//!
//! ```
//! use paymock_engine::settings::{EngineSettings, ExpansionPolicy};
//!
//! let settings = EngineSettings::from_toml_str(r#"
//! expansion = "strict"
//! max_expansion_depth = 2
//! "#).unwrap();
//! assert_eq!(settings.expansion, ExpansionPolicy::Strict);
//! assert_eq!(settings.default_payment_method_types, vec!["card".to_string()]);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default hosted checkout page prefix.
pub const DEFAULT_CHECKOUT_BASE_URL: &str = "https://checkout.stripe.com/c/pay/";

/// How the resolver treats expansion paths it cannot follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpansionPolicy {
	/// Unknown fields are ignored and deep paths are truncated.
	#[default]
	Permissive,
	/// Unknown fields and over-deep paths fail with `CannotExpand`.
	Strict,
}

/// Settings errors.
#[derive(Debug, Error)]
pub enum SettingsError {
	/// TOML could not be parsed into settings
	#[error("Failed to parse settings: {0}")]
	Parse(#[from] toml::de::Error),

	/// A setting has an unusable value
	#[error("Invalid setting {field}: {message}")]
	Invalid {
		/// Setting name
		field: String,
		/// What is wrong with it
		message: String,
	},
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
	/// Payment method types used when a request omits them
	pub default_payment_method_types: Vec<String>,
	/// Prefix of checkout session URLs; the session id is appended
	pub checkout_base_url: String,
	/// Treatment of unexpandable paths
	pub expansion: ExpansionPolicy,
	/// Maximum number of segments in an expansion path
	pub max_expansion_depth: usize,
	/// Value of `livemode` on created objects
	pub livemode: bool,
}

impl Default for EngineSettings {
	fn default() -> Self {
		Self {
			default_payment_method_types: vec!["card".to_string()],
			checkout_base_url: DEFAULT_CHECKOUT_BASE_URL.to_string(),
			expansion: ExpansionPolicy::Permissive,
			max_expansion_depth: 4,
			livemode: false,
		}
	}
}

impl EngineSettings {
	/// Parses and validates settings from TOML. Missing keys take defaults.
	pub fn from_toml_str(source: &str) -> SettingsResult<Self> {
		let settings: Self = toml::from_str(source)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Checks every setting for a usable value.
	pub fn validate(&self) -> SettingsResult<()> {
		if self.default_payment_method_types.is_empty() {
			return Err(invalid(
				"default_payment_method_types",
				"at least one payment method type is required",
			));
		}
		if self.max_expansion_depth == 0 {
			return Err(invalid("max_expansion_depth", "must be at least 1"));
		}
		let url = Url::parse(&self.checkout_base_url)
			.map_err(|e| invalid("checkout_base_url", e.to_string()))?;
		if !matches!(url.scheme(), "http" | "https") {
			return Err(invalid("checkout_base_url", "must be an http(s) URL"));
		}
		if url.cannot_be_a_base() {
			return Err(invalid("checkout_base_url", "must be usable as a base URL"));
		}
		Ok(())
	}

	/// Sets the expansion policy.
	pub fn with_expansion(mut self, policy: ExpansionPolicy) -> Self {
		self.expansion = policy;
		self
	}

	/// Sets the maximum expansion depth.
	pub fn with_max_expansion_depth(mut self, depth: usize) -> Self {
		self.max_expansion_depth = depth;
		self
	}

	/// Sets the default payment method types.
	pub fn with_default_payment_method_types<I, S>(mut self, types: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.default_payment_method_types = types.into_iter().map(Into::into).collect();
		self
	}

	/// Sets the checkout URL prefix.
	pub fn with_checkout_base_url(mut self, url: impl Into<String>) -> Self {
		self.checkout_base_url = url.into();
		self
	}

	/// Sets `livemode` for created objects.
	pub fn with_livemode(mut self, livemode: bool) -> Self {
		self.livemode = livemode;
		self
	}

	/// Hosted page URL of a checkout session.
	pub fn checkout_url(&self, session_id: &str) -> String {
		Url::parse(&self.checkout_base_url)
			.and_then(|base| base.join(session_id))
			.map(String::from)
			.unwrap_or_else(|_| format!("{}{}", self.checkout_base_url, session_id))
	}
}

fn invalid(field: &str, message: impl Into<String>) -> SettingsError {
	SettingsError::Invalid {
		field: field.to_string(),
		message: message.into(),
	}
}
