//! The [`ItemKey`] abstraction: a typed, driver-specific reference to one
//! object inside a storage driver.

use std::any::Any;
use std::fmt::Debug;

/// A driver-specific, opaque identifier for one stored object.
///
/// Every driver defines its own key schema (a path, an environment variable
/// name, a URI) by implementing this trait. `as_string` must be stable
/// across process restarts for equal inputs — transformers use it as the
/// logical file identifier. `as_any` lets a driver recover its own
/// concrete key type from the `&dyn ItemKey` the engine hands it back,
/// the same role `isinstance(item_key, Model)` plays in the original.
pub trait ItemKey: Debug + Send + Sync {
    /// The stable string form of this key, used by transformers as the
    /// logical file identifier.
    fn as_string(&self) -> String;

    /// Expose this key as `Any` so a driver can downcast it back to its
    /// own concrete key type.
    fn as_any(&self) -> &dyn Any;
}

/// Validate an opaque parameter map into a concrete [`ItemKey`].
///
/// Storage drivers implement this for their own key type; the engine only
/// ever deals in `Box<dyn ItemKey>` once a key has been validated.
pub trait FromParams: ItemKey + Sized {
    /// Build and validate a key from an untyped JSON parameter map.
    fn from_params(params: &serde_json::Value) -> crate::Result<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct PathKey {
        path: String,
    }

    impl ItemKey for PathKey {
        fn as_string(&self) -> String {
            self.path.clone()
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    impl FromParams for PathKey {
        fn from_params(params: &serde_json::Value) -> crate::Result<Self> {
            serde_json::from_value(params.clone()).map_err(crate::Error::from)
        }
    }

    #[test]
    fn string_form_is_stable() {
        let a = PathKey {
            path: "terraform.tfstate".to_string(),
        };
        let b = PathKey {
            path: "terraform.tfstate".to_string(),
        };
        assert_eq!(a.as_string(), b.as_string());
    }

    #[test]
    fn from_params_roundtrips() {
        let params = serde_json::json!({ "path": "main.tfstate" });
        let key = PathKey::from_params(&params).unwrap();
        assert_eq!(key.as_string(), "main.tfstate");
    }
}
