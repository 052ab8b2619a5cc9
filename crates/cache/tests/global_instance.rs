//! The process-wide accessor is a one-shot: this file holds a single test so
//! that no other test in the same binary can observe or race the singleton.

use forcebridge_cache::{
    initialize, instance, ConflictCacheService, MemoryStorage, StaticIdentity,
};
use forcebridge_core::{CacheEntry, Error};
use std::sync::Arc;

fn new_service() -> ConflictCacheService {
    ConflictCacheService::new(
        Arc::new(MemoryStorage::new()),
        Arc::new(StaticIdentity::new(
            Some("dev@example.com".to_string()),
            "/work/project",
        )),
    )
}

#[test]
fn global_instance_lifecycle() {
    let err = instance().err().expect("instance before initialize must fail");
    assert!(matches!(err, Error::NotInitialized { .. }));

    let installed = initialize(new_service()).expect("first initialize succeeds");
    installed
        .set("ApexClass", "Foo", Some(CacheEntry::new("2024-01-01T00:00:00.000Z")))
        .unwrap();

    let fetched = instance().expect("instance after initialize");
    assert!(Arc::ptr_eq(&installed, &fetched));
    assert_eq!(
        fetched.get("ApexClass", "Foo").unwrap(),
        Some(CacheEntry::new("2024-01-01T00:00:00.000Z"))
    );

    let err = initialize(new_service()).err().expect("second initialize fails");
    assert!(matches!(err, Error::AlreadyInitialized { .. }));
}
