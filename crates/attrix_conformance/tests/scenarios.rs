//! Reference scenarios for discovery, querying, caching and validation.

use attrix_cache::{CompiledCache, RecordStore, StoreOptions};
use attrix_common::{ArgumentValue, Arguments, AttributeRecord, TargetDescriptor, TargetKind};
use attrix_conformance::{TestProject, POSTS_CONTROLLER, USERS_CONTROLLER};
use attrix_registry::{validate, AttributeCollection};

fn kind_count(records: &AttributeCollection, kind: TargetKind) -> usize {
    records.with_target_kinds(&[kind]).len()
}

// ===========================================================================
// Scenario A: one controller, every target kind
// ===========================================================================

#[test]
fn scenario_a_discovers_four_records() {
    let project = TestProject::with_files(&[("src/Controller/UsersController.php", USERS_CONTROLLER)]);
    let mut registry = project.registry("");

    let all = registry.discover();
    assert_eq!(all.len(), 4);
    assert_eq!(kind_count(&all, TargetKind::Class), 1);
    assert_eq!(kind_count(&all, TargetKind::Property), 1);
    assert_eq!(kind_count(&all, TargetKind::Method), 2);

    let class = all.with_target_kinds(&[TargetKind::Class]);
    let class = class.first().unwrap();
    assert_eq!(class.owner_type, "App\\Controller\\UsersController");
    assert_eq!(class.attribute_type, "App\\Attribute\\Route");
    assert_eq!(class.target, TargetDescriptor::class("UsersController"));
    assert_eq!(
        class.arguments.get("path"),
        Some(&ArgumentValue::String("/users".into()))
    );
    assert_eq!(
        class.arguments.get("method"),
        Some(&ArgumentValue::String("GET".into()))
    );
    assert_eq!(class.source_file, project.path("src/Controller/UsersController.php"));
}

#[test]
fn scenario_a_methods_in_declaration_order() {
    let project = TestProject::with_files(&[("src/Controller/UsersController.php", USERS_CONTROLLER)]);
    let mut registry = project.registry("");

    let methods = registry.find_by_target_type(TargetKind::Method);
    let names: Vec<String> = methods.map(|r| r.target.to_string());
    assert_eq!(
        names,
        vec![
            "method UsersController::index()",
            "method UsersController::view()"
        ]
    );
    assert!(methods.iter().all(|r| r.line_number > 0));
}

// ===========================================================================
// Scenario B: unknown attribute
// ===========================================================================

#[test]
fn scenario_b_unknown_attribute_is_empty() {
    let project = TestProject::with_files(&[("src/Controller/UsersController.php", USERS_CONTROLLER)]);
    let mut registry = project.registry("");
    assert!(!registry.discover().is_empty());
    assert!(registry.find_by_attribute("NonExistentMarker").is_empty());
}

// ===========================================================================
// Scenario C: namespace wildcard
// ===========================================================================

#[test]
fn scenario_c_namespace_wildcard_matches_nested_classes() {
    let project = TestProject::with_files(&[
        ("src/Controller/UsersController.php", USERS_CONTROLLER),
        ("src/Controller/Api/PostsController.php", POSTS_CONTROLLER),
    ]);
    let mut registry = project.registry("");
    let all = registry.discover();

    let nested = all.in_namespace("App\\Controller\\*");
    assert!(nested
        .iter()
        .any(|r| r.owner_type == "App\\Controller\\Api\\PostsController"));
    assert_eq!(nested.len(), 5);

    let exact = all.in_namespace("App\\Controller\\UsersController");
    assert_eq!(exact.len(), 4);
    assert!(!exact
        .iter()
        .any(|r| r.owner_type == "App\\Controller\\Api\\PostsController"));
}

// ===========================================================================
// Scenario D: closures are not cacheable
// ===========================================================================

#[test]
fn scenario_d_closure_argument_is_rejected() {
    let project = TestProject::new();
    let mut arguments = Arguments::new();
    arguments.insert(
        "handler",
        ArgumentValue::Closure {
            source: "static fn (): bool => true".into(),
        },
    );
    let record = AttributeRecord {
        owner_type: "App\\Listener".into(),
        attribute_type: "App\\Attribute\\On".into(),
        arguments,
        source_file: project.path("src/Listener.php"),
        line_number: 5,
        target: TargetDescriptor::class("Listener"),
        file_modified_at: 0,
        file_content_hash: String::new(),
        owning_plugin_name: None,
    };

    let mut cache = CompiledCache::new(project.cache_dir(), StoreOptions::default());
    assert!(!cache.set("listeners", &[record]));
    assert_eq!(cache.get("listeners"), None);
    assert!(project.cache_files().is_empty());
}

#[test]
fn scenario_d_closures_found_by_the_parser_are_not_cached() {
    let source = "<?php\nnamespace App;\n#[On(handler: static fn () => true)]\nclass Listener {}\n";
    let project = TestProject::with_files(&[("src/Listener.php", source)]);
    let (mut registry, _) = project.registry_with_log("");

    let all = registry.discover();
    assert_eq!(all.len(), 1);
    assert!(matches!(
        all.first().unwrap().arguments.get("handler"),
        Some(ArgumentValue::Closure { .. })
    ));
    assert!(project.cache_files().is_empty());
}

// ===========================================================================
// Scenario E: validator counts files once
// ===========================================================================

#[test]
fn scenario_e_two_records_one_file() {
    let project = TestProject::with_files(&[(
        "src/Entity/User.php",
        "<?php\nnamespace App\\Entity;\n#[Entity]\nclass User {\n    #[Column]\n    public int $id;\n}\n",
    )]);
    let mut registry = project.registry("");
    let all = registry.discover();
    assert_eq!(all.len(), 2);

    let result = validate(all.as_slice());
    assert!(result.valid);
    assert_eq!(result.total_attributes, 2);
    assert_eq!(result.total_files, 1);
}

#[test]
fn scenario_e_missing_file_is_reported() {
    let project = TestProject::with_files(&[(
        "src/Entity/User.php",
        "<?php\n#[Entity]\nclass User {}\n",
    )]);
    let mut registry = project.registry("");
    let all = registry.discover();
    std::fs::remove_file(project.path("src/Entity/User.php")).unwrap();

    let result = validate(all.as_slice());
    assert!(!result.valid);
    assert_eq!(
        result.errors,
        vec![format!(
            "File not found: {}",
            all.first().unwrap().source_file.display()
        )]
    );
}
