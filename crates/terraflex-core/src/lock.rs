//! The wire format of a held lock, and the arbitrary JSON state payload.

use serde::{Deserialize, Serialize};

/// Arbitrary JSON state blob stored/retrieved for a stack.
///
/// Terraform state documents are opaque to the backend; we only ever read
/// and write them as JSON values.
pub type Data = serde_json::Value;

/// The body exchanged on lock acquisition and release.
///
/// Field names and casing are fixed by the wire protocol clients speak —
/// `ID`, `Operation`, `Who`, `Version`, `Created` — and must not be
/// renamed to Rust convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockBody {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Operation")]
    pub operation: String,
    #[serde(rename = "Who")]
    pub who: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Created")]
    pub created: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_fixed_casing() {
        let body = LockBody {
            id: "abc123".to_string(),
            operation: "OperationTypePlan".to_string(),
            who: "alice@host".to_string(),
            version: "1.6.0".to_string(),
            created: "2026-07-27T00:00:00Z".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["ID"], "abc123");
        assert_eq!(json["Operation"], "OperationTypePlan");
        assert_eq!(json["Who"], "alice@host");
        assert_eq!(json["Version"], "1.6.0");
        assert_eq!(json["Created"], "2026-07-27T00:00:00Z");
    }

    #[test]
    fn roundtrips_through_json() {
        let raw = serde_json::json!({
            "ID": "l1",
            "Operation": "OperationTypeApply",
            "Who": "bob@host",
            "Version": "1.7.0",
            "Created": "2026-07-27T01:00:00Z",
        });
        let body: LockBody = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(body.id, "l1");
        let back = serde_json::to_value(&body).unwrap();
        assert_eq!(back, raw);
    }
}
