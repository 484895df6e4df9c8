//! Integration tests for the record stores behind the registry.

use std::sync::{Arc, Barrier};
use std::thread;

use attrix_cache::artifact::{decode_artifact, ARTIFACT_EXTENSION};
use attrix_cache::{CompiledCache, RecordStore, StoreOptions};
use attrix_common::{ArgumentValue, Arguments, AttributeRecord, ContentHash, TargetDescriptor, TargetKind};
use attrix_conformance::{TestProject, USERS_CONTROLLER};
use attrix_registry::{DiscoveryEvent, REGISTRY_KEY};
use indexmap::IndexMap;

const USERS_PATH: &str = "src/Controller/UsersController.php";

fn users_project() -> TestProject {
    TestProject::with_files(&[(USERS_PATH, USERS_CONTROLLER)])
}

// ===========================================================================
// Idempotence
// ===========================================================================

#[test]
fn discover_twice_is_equal_and_scans_once() {
    let project = users_project();
    let (mut registry, log) = project.registry_with_log("");

    let first = registry.discover();
    assert!(log.take().contains(&DiscoveryEvent::BeforeScan));

    let second = registry.discover();
    assert_eq!(first, second);
    assert_eq!(
        log.take(),
        vec![DiscoveryEvent::BeforeDiscover, DiscoveryEvent::AfterDiscover(4)]
    );
}

#[test]
fn a_new_registry_loads_the_artifact_instead_of_scanning() {
    let project = users_project();
    let first = project.registry("").discover();
    assert_eq!(project.cache_files().len(), 1);

    let (mut registry, log) = project.registry_with_log("");
    let second = registry.discover();
    assert_eq!(first, second);
    assert_eq!(
        log.events(),
        vec![DiscoveryEvent::BeforeDiscover, DiscoveryEvent::AfterDiscover(4)]
    );
}

#[test]
fn arguments_built_from_class_constants_are_persisted() {
    let project = TestProject::with_files(&[(
        "src/Controller/PanelController.php",
        r#"<?php
namespace App\Controller;

use App\Attribute\Route;

class PanelController
{
    const PREFIX = '/panel';

    #[Route(self::PREFIX . '/list')]
    public function list() {}
}
"#,
    )]);
    let first = project.registry("").discover();
    assert_eq!(
        first.first().unwrap().arguments.get("0"),
        Some(&ArgumentValue::String("/panel/list".into()))
    );
    assert_eq!(project.cache_files().len(), 1);

    let (mut registry, log) = project.registry_with_log("");
    assert_eq!(registry.discover(), first);
    assert!(!log.events().contains(&DiscoveryEvent::BeforeScan));
}

#[test]
fn corrupt_artifact_triggers_a_rescan() {
    let project = users_project();
    project.registry("").discover();
    let artifact = project.cache_files().remove(0);
    std::fs::write(&artifact, b"\x10\x00\x00\x00not an artifact").unwrap();

    let (mut registry, log) = project.registry_with_log("");
    assert_eq!(registry.discover().len(), 4);
    assert!(log.events().contains(&DiscoveryEvent::BeforeScan));
    let raw = std::fs::read(&artifact).unwrap();
    assert_eq!(decode_artifact(&artifact, &raw).unwrap().len(), 4);
}

// ===========================================================================
// Disabled cache
// ===========================================================================

#[test]
fn disabled_cache_writes_nothing() {
    let project = users_project();
    let mut registry = project.registry("[cache]\nenabled = false\n");
    assert!(!registry.is_cache_enabled());
    assert_eq!(registry.discover().len(), 4);
    assert!(!project.cache_dir().exists());

    let (mut again, log) = project.registry_with_log("[cache]\nenabled = false\n");
    assert_eq!(again.discover().len(), 4);
    assert!(log.events().contains(&DiscoveryEvent::BeforeScan));
    assert!(!project.path("tmp").exists());
}

// ===========================================================================
// Validation mode
// ===========================================================================

#[test]
fn validation_mode_detects_changed_content() {
    let project = users_project();
    project.registry("[cache]\nvalidate_files = true\n").discover();
    project.write(USERS_PATH, "<?php\nnamespace App;\n#[Only]\nclass UsersController {}\n");

    let mut validating = project.registry("[cache]\nvalidate_files = true\n");
    let fresh = validating.discover();
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh.first().unwrap().attribute_type, "App\\Only");
}

#[test]
fn without_validation_the_stale_set_is_returned() {
    let project = users_project();
    project.registry("").discover();
    project.write(USERS_PATH, "<?php\nnamespace App;\n#[Only]\nclass UsersController {}\n");

    let mut trusting = project.registry("");
    assert_eq!(trusting.discover().len(), 4);
}

#[test]
fn backend_engine_validates_the_same_way() {
    let config = "[cache]\nengine = \"backend\"\nbackend = \"file\"\nvalidate_files = true\n";
    let project = users_project();
    assert_eq!(project.registry(config).discover().len(), 4);
    assert!(project
        .cache_files()
        .iter()
        .all(|p| p.extension().and_then(|e| e.to_str()) == Some("blob")));

    project.write(USERS_PATH, "<?php\n#[Only]\nclass UsersController {}\n");
    assert_eq!(project.registry(config).discover().len(), 1);
}

#[test]
fn warm_cache_rebuilds_the_artifact() {
    let project = users_project();
    let mut registry = project.registry("");
    registry.discover();
    project.write(USERS_PATH, "<?php\n#[Only]\nclass UsersController {}\n");

    let report = registry.warm_cache();
    assert!(report.cleared);
    assert_eq!(report.attributes, 1);
    assert_eq!(report.failed_files, 0);
    assert_eq!(project.registry("").discover().len(), 1);
}

// ===========================================================================
// Concurrent writers
// ===========================================================================

fn record(project: &TestProject, owner: &str) -> AttributeRecord {
    let path = project.path(USERS_PATH);
    AttributeRecord {
        owner_type: owner.into(),
        attribute_type: "App\\Attribute\\Route".into(),
        arguments: Arguments::new(),
        source_file: path,
        line_number: 10,
        target: TargetDescriptor::class(owner),
        file_modified_at: 0,
        file_content_hash: ContentHash::of_bytes(USERS_CONTROLLER.as_bytes()).to_hex(),
        owning_plugin_name: None,
    }
}

#[test]
fn concurrent_writers_leave_one_valid_artifact() {
    let project = users_project();
    let writers = 4;
    let barrier = Arc::new(Barrier::new(writers));
    let handles: Vec<_> = (0..writers)
        .map(|i| {
            let dir = project.cache_dir();
            let records = vec![record(&project, &format!("Writer{i}")); 50];
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut cache = CompiledCache::new(dir, StoreOptions::default());
                barrier.wait();
                for _ in 0..10 {
                    assert!(cache.set(REGISTRY_KEY, &records));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let files = project.cache_files();
    assert_eq!(files.len(), 1);
    assert_eq!(
        files[0].extension().and_then(|e| e.to_str()),
        Some(ARTIFACT_EXTENSION)
    );
    let raw = std::fs::read(&files[0]).unwrap();
    let records = decode_artifact(&files[0], &raw).unwrap();
    assert_eq!(records.len(), 50);
    let owner = &records[0].owner_type;
    assert!(owner.starts_with("Writer"));
    assert!(records.iter().all(|r| &r.owner_type == owner));
}

// ===========================================================================
// Round trip
// ===========================================================================

#[test]
fn adversarial_values_round_trip_through_a_fresh_cache() {
    let project = TestProject::new();
    let mut nested = IndexMap::new();
    nested.insert("".to_string(), ArgumentValue::Null);
    nested.insert("'; DROP TABLE".to_string(), ArgumentValue::Float(f64::NEG_INFINITY));
    nested.insert(
        "obj".to_string(),
        ArgumentValue::Object {
            class: "App\\Dto\\Range".into(),
            arguments: [("min".to_string(), ArgumentValue::Int(i64::MIN))]
                .into_iter()
                .collect(),
        },
    );

    let mut arguments = Arguments::new();
    arguments.insert("nan", ArgumentValue::Float(f64::NAN));
    arguments.insert("inf", ArgumentValue::Float(f64::INFINITY));
    arguments.insert("neg_zero", ArgumentValue::Float(-0.0));
    arguments.insert("text", ArgumentValue::String("?>\u{0}\u{feff}\"'\\\n<?php $x".into()));
    arguments.insert("emoji", ArgumentValue::String("路由 🚀".into()));
    arguments.insert("map", ArgumentValue::Map(nested));
    arguments.insert(
        "role",
        ArgumentValue::EnumCase {
            enum_type: "App\\Role".into(),
            case: "Admin".into(),
        },
    );
    arguments.insert(
        "list",
        ArgumentValue::List(vec![ArgumentValue::Bool(false), ArgumentValue::Int(i64::MAX)]),
    );

    let record = AttributeRecord {
        owner_type: "App\\Weird\\Ünïcode".into(),
        attribute_type: "App\\Attribute\\Everything".into(),
        arguments,
        source_file: project.path("src/We ird/Ünïcode.php"),
        line_number: u32::MAX,
        target: TargetDescriptor::member(TargetKind::Parameter, "value", "Ünïcode"),
        file_modified_at: -1,
        file_content_hash: String::new(),
        owning_plugin_name: Some("Plugin/With:Odd*Chars".into()),
    };

    let key = "key with spaces/and:colons";
    let mut writer = CompiledCache::new(project.cache_dir(), StoreOptions::default());
    assert!(writer.set(key, std::slice::from_ref(&record)));

    let mut reader = CompiledCache::new(project.cache_dir(), StoreOptions::default());
    let loaded = reader.get(key).unwrap();
    assert_eq!(loaded, vec![record]);
    let neg_zero = loaded[0].arguments.get("neg_zero").and_then(ArgumentValue::as_float);
    assert!(neg_zero.is_some_and(|v| v == 0.0 && v.is_sign_negative()));
}
