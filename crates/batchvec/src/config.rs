#![forbid(unsafe_code)]

//! Notification policy for [`BatchVec`](crate::BatchVec).
//!
//! The default policy reproduces the literal notification stream of the
//! batch operations:
//!
//! - only `add_range` (and therefore `replace`) reports `Count` / `Items`
//!   property changes;
//! - `remove_all` reports an empty `Remove` when nothing matched.
//!
//! Both can be switched. With the `policy-config` feature the policy can also
//! be loaded from a TOML or JSON document:
//!
//! ```toml
//! property-notifications = "uniform"
//! empty-removal = "suppress"
//! ```

#[cfg(feature = "policy-config")]
use crate::error::BatchError;

/// Which batch operations report property changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum PropertyNotifications {
    /// Only range additions report `Count` and `Items`.
    #[default]
    AddOnly,
    /// Removals also report `Count` and `Items`; element replacement reports
    /// `Items`.
    Uniform,
}

/// What `remove_all` does when the predicate matched nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum EmptyRemoval {
    /// Emit a `Remove` notification with no items.
    #[default]
    Emit,
    /// Emit nothing.
    Suppress,
}

/// Notification policy for a batch collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, rename_all = "kebab-case", deny_unknown_fields)
)]
pub struct BatchConfig {
    pub property_notifications: PropertyNotifications,
    pub empty_removal: EmptyRemoval,
}

impl BatchConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_property_notifications(mut self, policy: PropertyNotifications) -> Self {
        self.property_notifications = policy;
        self
    }

    #[must_use]
    pub fn with_empty_removal(mut self, policy: EmptyRemoval) -> Self {
        self.empty_removal = policy;
        self
    }

    pub(crate) fn uniform_properties(&self) -> bool {
        self.property_notifications == PropertyNotifications::Uniform
    }

    pub(crate) fn suppress_empty_removal(&self) -> bool {
        self.empty_removal == EmptyRemoval::Suppress
    }
}

#[cfg(feature = "policy-config")]
impl BatchConfig {
    /// Parse a policy from TOML.
    ///
    /// # Errors
    ///
    /// [`BatchError::Config`] if the document is malformed or names an
    /// unknown key or policy.
    pub fn from_toml_str(src: &str) -> Result<Self, BatchError> {
        toml::from_str(src).map_err(|e| BatchError::Config(e.to_string()))
    }

    /// Parse a policy from JSON.
    ///
    /// # Errors
    ///
    /// [`BatchError::Config`] if the document is malformed or names an
    /// unknown key or policy.
    pub fn from_json_str(src: &str) -> Result<Self, BatchError> {
        serde_json::from_str(src).map_err(|e| BatchError::Config(e.to_string()))
    }

    /// Load a policy file. `.json` files are parsed as JSON, anything else
    /// as TOML.
    ///
    /// # Errors
    ///
    /// [`BatchError::Config`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, BatchError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .map_err(|e| BatchError::Config(format!("{}: {e}", path.display())))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&src)
        } else {
            Self::from_toml_str(&src)
        }
    }
}
