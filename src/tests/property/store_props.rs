//! Credential Store Properties
//!
//! Migration guards and value-type preservation over generated inputs.

use proptest::prelude::*;

use crate::core::credentials::{CredentialStore, StoreValue};

fn store_value_strategy() -> impl Strategy<Value = StoreValue> {
    prop_oneof![
        any::<String>().prop_map(StoreValue::Str),
        any::<i32>().prop_map(StoreValue::Int),
        any::<i64>().prop_map(StoreValue::Long),
        any::<f32>()
            .prop_filter("finite floats only", |f| f.is_finite())
            .prop_map(StoreValue::Float),
        any::<bool>().prop_map(StoreValue::Bool),
    ]
}

proptest! {
    /// Same source and destination is always rejected, whatever the
    /// name, with nothing created on disk.
    #[test]
    fn migrate_to_same_name_is_always_rejected(name in "[a-z][a-z0-9_]{0,15}") {
        let dir = tempfile::tempdir().unwrap();
        prop_assert!(!CredentialStore::migrate_in(dir.path(), &name, &name));
        prop_assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    /// Typed values survive a serialization round trip exactly, which
    /// is what migration leans on to avoid lossy coercion.
    #[test]
    fn store_values_round_trip(value in store_value_strategy()) {
        let json = serde_json::to_string(&value).unwrap();
        let back: StoreValue = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, value);
    }
}
