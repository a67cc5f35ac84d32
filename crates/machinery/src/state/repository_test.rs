use std::sync::Arc;

use crate::error::Error;
use crate::runtime::ObjectMeta;
use crate::test_support::{named, test_registry, OtherObject, TestObject, TestObjectList};

use super::events::EventType;
use super::repository::Repository;
use super::Client;

fn test_repository() -> Repository {
    let registry = test_registry();
    Repository::new(
        Arc::clone(&registry),
        &TestObject::default(),
        &TestObjectList::default(),
    )
    .unwrap()
}

#[test]
fn get_decodes_stored_objects() {
    let repository = test_repository();
    repository.insert_raw(
        "test123",
        br#"{"kind":"TestObject","version":"v1","metadata":{"name":"test123"}}"#,
    );

    let mut obj = TestObject::default();
    repository.get("test123", &mut obj).unwrap();
    assert_eq!(obj.metadata.name, "test123");
}

#[test]
fn get_of_absent_key_is_not_found() {
    let repository = test_repository();

    let mut obj = TestObject::default();
    let err = repository.get("missing", &mut obj).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn get_rejects_wrong_kinds() {
    let repository = test_repository();

    let mut obj = OtherObject::default();
    let err = repository.get("anything", &mut obj).unwrap_err();
    assert!(matches!(err, Error::WrongKind { .. }));
}

#[test]
fn list_collects_every_entry() {
    let repository = test_repository();
    repository.insert_raw(
        "test123",
        br#"{"kind":"TestObject","version":"v1","metadata":{"name":"test123"}}"#,
    );

    let mut list = TestObjectList::default();
    repository.list(&mut list).unwrap();
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].metadata.name, "test123");
}

#[test]
fn create_initializes_metadata_and_stores_canonical_json() {
    let repository = test_repository();

    let mut obj = named("test3000");
    repository.create(&mut obj).unwrap();

    // The caller's object observes the assigned metadata.
    assert_eq!(obj.metadata.generation, 1);
    assert_eq!(obj.metadata.resource_version, "1");

    assert_eq!(
        String::from_utf8(repository.raw("test3000").unwrap()).unwrap(),
        r#"{"kind":"TestObject","version":"v1","metadata":{"name":"test3000","generation":1,"resourceVersion":"1"},"spec":{"value":""},"status":{"observedValue":""}}"#,
    );
}

#[test]
fn create_round_trips_through_get() {
    let repository = test_repository();

    let mut obj = named("home");
    obj.spec.value = "eth0".to_string();
    repository.create(&mut obj).unwrap();

    let mut fetched = TestObject::default();
    repository.get("home", &mut fetched).unwrap();
    assert_eq!(fetched, obj);
    assert_eq!(fetched.metadata.generation, 1);
    assert_eq!(fetched.metadata.resource_version, "1");
}

#[test]
fn create_of_duplicate_name_already_exists() {
    let repository = test_repository();

    repository.create(&mut named("home")).unwrap();
    let err = repository.create(&mut named("home")).unwrap_err();
    assert!(err.is_already_exists());
}

#[test]
fn update_steps_generation_and_resource_version() {
    let repository = test_repository();
    repository.insert_raw(
        "test123",
        br#"{"kind":"TestObject","version":"v1","metadata":{"name":"test123","generation":3,"resourceVersion":"53"}}"#,
    );

    let mut obj = TestObject {
        metadata: ObjectMeta {
            name: "test123".to_string(),
            generation: 3,
            resource_version: "53".to_string(),
        },
        ..Default::default()
    };
    repository.update(&mut obj).unwrap();

    assert_eq!(obj.metadata.generation, 4);
    assert_eq!(obj.metadata.resource_version, "54");
}

#[test]
fn updates_accumulate() {
    let repository = test_repository();

    let mut obj = named("home");
    repository.create(&mut obj).unwrap();

    for round in 0..3 {
        obj.spec.value = format!("wan{round}");
        repository.update(&mut obj).unwrap();
    }

    let mut fetched = TestObject::default();
    repository.get("home", &mut fetched).unwrap();
    assert_eq!(fetched.metadata.generation, 4);
    assert_eq!(fetched.metadata.resource_version, "4");
    assert_eq!(fetched.spec.value, "wan2");
}

#[test]
fn update_preserves_status() {
    let repository = test_repository();

    let mut obj = named("home");
    repository.create(&mut obj).unwrap();

    obj.status.observed_value = "seen".to_string();
    repository.update_status(&mut obj).unwrap();

    // The next update may not smuggle a status change in.
    obj.spec.value = "wan0".to_string();
    obj.status.observed_value = "forged".to_string();
    repository.update(&mut obj).unwrap();
    assert_eq!(obj.status.observed_value, "seen");

    let mut fetched = TestObject::default();
    repository.get("home", &mut fetched).unwrap();
    assert_eq!(fetched.spec.value, "wan0");
    assert_eq!(fetched.status.observed_value, "seen");
}

#[test]
fn update_with_stale_resource_version_conflicts() {
    let repository = test_repository();

    let mut obj = named("home");
    repository.create(&mut obj).unwrap();
    let stored = repository.raw("home").unwrap();

    let mut stale = obj.clone();
    stale.metadata.resource_version = "0".to_string();
    stale.spec.value = "wan0".to_string();
    let err = repository.update(&mut stale).unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(repository.raw("home").unwrap(), stored);
}

#[test]
fn update_status_leaves_spec_and_generation_alone() {
    let repository = test_repository();

    let mut obj = named("home");
    obj.spec.value = "eth0".to_string();
    repository.create(&mut obj).unwrap();

    obj.spec.value = "forged".to_string();
    obj.status.observed_value = "seen".to_string();
    repository.update_status(&mut obj).unwrap();

    // The carried-back spec is visible to the caller too.
    assert_eq!(obj.spec.value, "eth0");
    assert_eq!(obj.metadata.generation, 1);
    assert_eq!(obj.metadata.resource_version, "2");

    let mut fetched = TestObject::default();
    repository.get("home", &mut fetched).unwrap();
    assert_eq!(fetched.metadata.generation, 1);
    assert_eq!(fetched.metadata.resource_version, "2");
    assert_eq!(fetched.spec.value, "eth0");
    assert_eq!(fetched.status.observed_value, "seen");
}

#[test]
fn update_status_with_stale_resource_version_conflicts() {
    let repository = test_repository();

    let mut obj = named("home");
    repository.create(&mut obj).unwrap();

    obj.metadata.resource_version = "7".to_string();
    let err = repository.update_status(&mut obj).unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn delete_removes_the_entry() {
    let repository = test_repository();

    let mut obj = named("home");
    repository.create(&mut obj).unwrap();
    repository.delete(&mut obj).unwrap();

    let mut fetched = TestObject::default();
    assert!(repository.get("home", &mut fetched).unwrap_err().is_not_found());
}

#[test]
fn delete_of_absent_key_is_not_found() {
    let repository = test_repository();

    let err = repository.delete(&mut named("missing")).unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn watch_sees_changes_in_commit_order() {
    let repository = test_repository();
    let mut subscription = repository.watch(&TestObject::default()).unwrap();

    let mut a = named("a");
    let mut b = named("b");
    repository.create(&mut a).unwrap();
    repository.create(&mut b).unwrap();
    repository.delete(&mut a).unwrap();

    let first = subscription.recv().await.unwrap();
    assert_eq!(first.event_type(), EventType::Added);
    assert_eq!(first.object().unwrap().meta().name, "a");

    let second = subscription.recv().await.unwrap();
    assert_eq!(second.event_type(), EventType::Added);
    assert_eq!(second.object().unwrap().meta().name, "b");

    let third = subscription.recv().await.unwrap();
    assert_eq!(third.event_type(), EventType::Deleted);
    assert_eq!(third.object().unwrap().meta().name, "a");
}

#[tokio::test]
async fn watch_events_carry_old_and_new_state() {
    let repository = test_repository();
    let mut subscription = repository.watch(&TestObject::default()).unwrap();

    let mut obj = named("home");
    repository.create(&mut obj).unwrap();
    obj.spec.value = "wan0".to_string();
    repository.update(&mut obj).unwrap();

    let created = subscription.recv().await.unwrap();
    assert!(created.old.is_none());

    let updated = subscription.recv().await.unwrap();
    let old = updated.old.unwrap();
    let new = updated.new.unwrap();
    assert_eq!(old.meta().generation, 1);
    assert_eq!(new.meta().generation, 2);
}

#[tokio::test]
async fn slow_subscribers_are_evicted_without_stalling_others() {
    let repository = Arc::new(test_repository());
    let mut slow = repository.watch(&TestObject::default()).unwrap();
    let mut fast = repository.watch(&TestObject::default()).unwrap();

    let drained = tokio::spawn(async move {
        let mut names = Vec::new();
        while let Some(event) = fast.recv().await {
            names.push(event.object().unwrap().meta().name.clone());
            if names.len() == 101 {
                break;
            }
        }
        names
    });

    // One more event than the subscription buffer holds. The fast consumer
    // keeps draining; the slow one never reads.
    for i in 0..101 {
        repository.create(&mut named(&format!("obj{i}"))).unwrap();
        tokio::task::yield_now().await;
    }

    let names = drained.await.unwrap();
    assert_eq!(names.len(), 101);
    assert_eq!(names[0], "obj0");
    assert_eq!(names[100], "obj100");

    // The slow subscription was closed on overflow: it drains what was
    // buffered and then ends.
    let mut received = 0;
    while slow.recv().await.is_some() {
        received += 1;
    }
    assert_eq!(received, 100);
}
