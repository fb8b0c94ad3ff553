//! Stack orchestration: the capability/lock/transformer plumbing that
//! sits between the HTTP surface and a raw storage driver.

pub mod controller;
pub mod stack;

pub use controller::StateLockController;
pub use stack::Stack;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use terraflex_core::{Error, ItemKey, LockBody};
    use terraflex_storage::{DriverHandle, LocalDriver, LocalKey};
    use terraflex_transform::Transformer;

    fn local_stack(dir: &std::path::Path) -> Stack {
        let driver = LocalDriver::new(dir, 0o700, 0o600).unwrap();
        let key: Arc<dyn ItemKey> = Arc::new(LocalKey {
            path: "terraform.tfstate".to_string(),
        });
        Stack::new(DriverHandle::Lockable(Arc::new(driver)), key, vec![])
    }

    fn lock_body(id: &str) -> LockBody {
        LockBody {
            id: id.to_string(),
            operation: "OperationTypeApply".to_string(),
            who: "alice@host".to_string(),
            version: "1.7.0".to_string(),
            created: "2026-07-27T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn full_lifecycle_on_local_driver() {
        let dir = tempfile::tempdir().unwrap();
        let mut stacks = HashMap::new();
        stacks.insert("main".to_string(), local_stack(dir.path()));
        let controller = StateLockController::new(stacks);

        assert_eq!(controller.get("main").await.unwrap(), None);

        controller.lock("main", &lock_body("l1")).await.unwrap();

        let value = serde_json::json!({"a": 1});
        controller.put("main", "l1", &value).await.unwrap();

        assert_eq!(controller.get("main").await.unwrap(), Some(value));

        controller.unlock("main").await.unwrap();
        assert_eq!(controller.read_lock("main").await.unwrap(), None);
    }

    #[tokio::test]
    async fn wrong_holder_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut stacks = HashMap::new();
        stacks.insert("main".to_string(), local_stack(dir.path()));
        let controller = StateLockController::new(stacks);

        controller.lock("main", &lock_body("l1")).await.unwrap();
        let err = controller
            .put("main", "l2", &serde_json::json!({"a": 1}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LockConflict { .. }));
    }

    #[tokio::test]
    async fn delete_without_any_lock_held_is_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let mut stacks = HashMap::new();
        stacks.insert("main".to_string(), local_stack(dir.path()));
        let controller = StateLockController::new(stacks);

        let err = controller
            .delete("main", "l1")
            .await
            .unwrap_err();
        match err {
            Error::LockConflict { message, id } => {
                assert_eq!(message, "no lock held");
                assert_eq!(id, "l1");
            }
            other => panic!("expected LockConflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_stack_errors() {
        let controller = StateLockController::new(HashMap::new());
        let err = controller.get("ghost").await.unwrap_err();
        assert!(matches!(err, Error::UnknownStack(_)));
    }

    #[tokio::test]
    async fn non_lockable_driver_rejects_write() {
        use terraflex_storage::EnvVarDriver;

        let mut stacks = HashMap::new();
        let key: Arc<dyn ItemKey> = Arc::new(terraflex_storage::EnvVarKey {
            key: "TERRAFLEX_TEST_STATE".to_string(),
        });
        stacks.insert(
            "main".to_string(),
            Stack::new(DriverHandle::Readable(Arc::new(EnvVarDriver::new())), key, vec![]),
        );
        let controller = StateLockController::new(stacks);

        let err = controller
            .put("main", "l1", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedCapability(_)));
    }

    struct UppercaseTransformer;

    #[async_trait::async_trait]
    impl Transformer for UppercaseTransformer {
        async fn encode(&self, _file_name: &str, content: &[u8]) -> terraflex_core::Result<Vec<u8>> {
            Ok(content.to_ascii_uppercase())
        }

        async fn decode(&self, _file_name: &str, content: &[u8]) -> terraflex_core::Result<Vec<u8>> {
            Ok(content.to_ascii_lowercase())
        }
    }

    #[tokio::test]
    async fn transformer_chain_applies_around_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let driver = LocalDriver::new(dir.path(), 0o700, 0o600).unwrap();
        let key: Arc<dyn ItemKey> = Arc::new(LocalKey {
            path: "terraform.tfstate".to_string(),
        });
        let transformers: Vec<Arc<dyn Transformer>> = vec![Arc::new(UppercaseTransformer)];
        let mut stacks = HashMap::new();
        stacks.insert(
            "main".to_string(),
            Stack::new(DriverHandle::Lockable(Arc::new(driver)), key, transformers),
        );
        let controller = StateLockController::new(stacks);

        controller.lock("main", &lock_body("l1")).await.unwrap();
        controller
            .put("main", "l1", &serde_json::json!({"a": 1}))
            .await
            .unwrap();

        let raw = std::fs::read(dir.path().join("terraform.tfstate")).unwrap();
        assert_ne!(raw, serde_json::to_vec(&serde_json::json!({"a": 1})).unwrap());
        assert_eq!(raw, serde_json::to_vec(&serde_json::json!({"a": 1})).unwrap().to_ascii_uppercase());

        assert_eq!(
            controller.get("main").await.unwrap(),
            Some(serde_json::json!({"a": 1}))
        );
    }
}
