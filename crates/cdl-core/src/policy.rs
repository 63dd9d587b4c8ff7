//! Error policy for out-of-domain input.

use serde::{Deserialize, Serialize};

/// Decides what happens when a value is the right type but out of range.
///
/// Type errors and identity collisions are reported under either policy.
///
/// ```rust
/// use cdl_core::ValuePolicy;
///
/// assert_eq!(ValuePolicy::default(), ValuePolicy::Lenient);
/// assert!(ValuePolicy::from_strict(true).is_strict());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValuePolicy {
    /// Fail with a value error and keep the previous state.
    Strict,
    /// Clamp or substitute a fallback, log a warning, and carry on.
    #[default]
    Lenient,
}

impl ValuePolicy {
    /// Maps the `strict_errors` flag onto a policy.
    pub fn from_strict(strict: bool) -> Self {
        if strict { Self::Strict } else { Self::Lenient }
    }

    /// Returns `true` for [`ValuePolicy::Strict`].
    pub fn is_strict(self) -> bool {
        self == Self::Strict
    }
}
