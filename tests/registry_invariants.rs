//! Registry Invariant Tests
//!
//! Declaration-side invariants of the schema registry:
//! - A property is real or virtual, never both
//! - Read-only and write-only exclude each other
//! - Every format annotation adds one (format, validator) pair
//! - View filtering honors declared views and the wildcard
//! - Joins resolve against existing real columns
//! - Reads return copies

use rowschema::config::RegistryConfig;
use rowschema::schema::{
    alias, array, entity, enumeration, hidden, id, integer, join, join_all, null, primary,
    read_only, required, string, views, write_only, Column, EntityType, Format, SchemaErrorCode,
    SchemaRegistry,
};
use serde_json::json;

const USER: EntityType = EntityType::named("User");
const GROUP: EntityType = EntityType::named("Group");

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .define(GROUP)
        .storage("groups")
        .column("id", [id(), primary()])
        .column("title", [string(), required()])
        .finish()
        .unwrap();
    registry
        .define(USER)
        .storage("users")
        .column("id", [id(), primary(), read_only()])
        .column("name", [string(), required()])
        .column("password", [string(), write_only(), hidden()])
        .column("group_id", [id()])
        .column("group_ids", [array()])
        .finish()
        .unwrap();
    registry
}

// =============================================================================
// Column Kind Tests
// =============================================================================

/// Joining onto an existing real property fails.
#[test]
fn test_join_on_real_property_conflicts() {
    let mut registry = setup_registry();

    let result = registry.annotate(USER, "name", &join("id", GROUP, "group_id"));
    assert_eq!(result.unwrap_err().code(), SchemaErrorCode::ColumnKindConflict);
    assert!(registry.get_virtual_column(USER, "name").is_err());
}

/// Real-only annotations on a joined property fail.
#[test]
fn test_real_annotation_on_virtual_property_conflicts() {
    let mut registry = setup_registry();
    registry
        .declare(USER, "group", [join("id", GROUP, "group_id")])
        .unwrap();

    for annotation in [required(), string(), read_only()] {
        let err = registry.annotate(USER, "group", &annotation).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::ColumnKindConflict);
    }
    assert!(registry.get_real_column(USER, "group").is_err());
}

/// Aliases and views attach to the virtual column once it exists.
#[test]
fn test_shared_annotations_follow_existing_kind() {
    let mut registry = setup_registry();
    registry
        .declare(USER, "group", [join("id", GROUP, "group_id"), alias("team")])
        .unwrap();

    let column = registry.get_virtual_column(USER, "group").unwrap();
    assert_eq!(column.alias(), Some("team"));

    // Without a join, shared annotations create a real column
    registry.declare(USER, "nickname", [alias("nick")]).unwrap();
    assert_eq!(
        registry.get_real_column(USER, "nickname").unwrap().alias(),
        Some("nick")
    );
}

// =============================================================================
// Read/Write Exclusion Tests
// =============================================================================

#[test]
fn test_read_only_then_write_only_fails() {
    let mut registry = setup_registry();
    let err = registry.annotate(USER, "id", &write_only()).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::ReadWriteConflict);
    assert_eq!(err.column(), Some("id"));
}

#[test]
fn test_write_only_then_read_only_fails() {
    let mut registry = setup_registry();
    let err = registry.annotate(USER, "password", &read_only()).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::ReadWriteConflict);

    let column = registry.get_real_column(USER, "password").unwrap();
    assert!(column.write_only);
    assert!(!column.read_only);
}

// =============================================================================
// Format Tests
// =============================================================================

/// Each format annotation adds one format and one validator.
#[test]
fn test_formats_compose_as_or_group() {
    let mut registry = SchemaRegistry::new();
    registry.declare(USER, "score", [integer(), null()]).unwrap();

    let column = registry.get_real_column(USER, "score").unwrap();
    assert_eq!(column.formats(), &[Format::Integer, Format::Null]);
    assert_eq!(column.core.validators.len(), 2);

    assert!(column.validate("users", &json!(3)).is_ok());
    assert!(column.validate("users", &json!(null)).is_ok());

    let err = column.validate("users", &json!("three")).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::ValidationFailed);
    let details = err.details().unwrap();
    assert_eq!(details.field, "score");
    assert_eq!(details.expected, "INTEGER | NULL");
    assert_eq!(details.actual, "string");
}

#[test]
fn test_enumeration_validator() {
    let mut registry = SchemaRegistry::new();
    registry
        .declare(USER, "role", [enumeration(["admin", "member"])])
        .unwrap();

    let column = registry.get_real_column(USER, "role").unwrap();
    assert!(column.validator().check(&json!("admin")));
    assert!(!column.validator().check(&json!("guest")));
}

// =============================================================================
// View Tests
// =============================================================================

/// Columns without views match only their own name; the wildcard matches all.
#[test]
fn test_default_views() {
    let registry = setup_registry();

    let row = registry.get_real_row(USER, &["name", "group_id"]).unwrap();
    assert_eq!(row.names(), vec!["name", "group_id"]);

    let row = registry.get_real_row(USER, &["*"]).unwrap();
    assert_eq!(row.len(), 5);
    assert!(row.contains("password"));
}

#[test]
fn test_declared_views_replace_name() {
    let mut registry = setup_registry();
    registry
        .declare(USER, "email", [string(), views(["contact", "private"])])
        .unwrap();

    assert!(registry.get_real_row(USER, &["email"]).unwrap().is_empty());
    assert_eq!(
        registry.get_real_row(USER, &["contact"]).unwrap().names(),
        vec!["email"]
    );
}

#[test]
fn test_empty_view_request_selects_nothing() {
    let registry = setup_registry();
    assert!(registry.get_real_row(USER, &[]).unwrap().is_empty());
    assert!(registry.get_virtual_row(USER, &[]).unwrap().is_empty());
}

#[test]
fn test_custom_wildcard() {
    let mut registry = SchemaRegistry::with_config(RegistryConfig::new().with_wildcard_view("$all"));
    registry.declare(USER, "name", [string()]).unwrap();
    registry.declare(USER, "email", [string(), views(["private"])]).unwrap();

    assert_eq!(registry.get_real_row(USER, &["$all"]).unwrap().len(), 2);
}

// =============================================================================
// Join Tests
// =============================================================================

#[test]
fn test_join_requires_foreign_column() {
    let mut registry = setup_registry();
    let err = registry
        .annotate(USER, "group", &join("slug", GROUP, "group_id"))
        .unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::UnknownColumn);
    assert_eq!(err.storage(), Some("groups"));
    assert_eq!(err.column(), Some("slug"));
}

#[test]
fn test_join_requires_local_column() {
    let mut registry = setup_registry();
    let err = registry
        .annotate(USER, "group", &join("id", GROUP, "team_id"))
        .unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::UnknownColumn);
    assert_eq!(err.storage(), Some("users"));
    assert_eq!(err.column(), Some("team_id"));
}

/// Declaring a join before its foreign type fails; declaring it after succeeds.
#[test]
fn test_join_declaration_order() {
    let mut registry = SchemaRegistry::new();
    registry.declare(USER, "group_id", [id()]).unwrap();

    let err = registry
        .annotate(USER, "group", &join("id", GROUP, "group_id"))
        .unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::UnknownColumn);

    registry.declare(GROUP, "id", [id(), primary()]).unwrap();
    registry
        .declare(USER, "group", [join("id", GROUP, "group_id")])
        .unwrap();
    assert!(registry.get_virtual_column(USER, "group").is_ok());
}

#[test]
fn test_join_shapes() {
    let mut registry = setup_registry();
    registry.declare(GROUP, "owner_id", [id()]).unwrap();
    registry
        .define(USER)
        .column("group", [join("id", GROUP, "group_id")])
        .column("groups", [join("id", GROUP, "group_ids")])
        .column("owned", [join_all("owner_id", GROUP, "id").filter(json!({"open": true}))])
        .finish()
        .unwrap();

    let single = registry.get_virtual_column(USER, "group").unwrap();
    assert_eq!(single.formats(), &[Format::Object]);
    assert!(!single.is_sequence());

    let multiple = registry.get_virtual_column(USER, "groups").unwrap();
    assert!(multiple.multiple);
    assert_eq!(multiple.formats(), &[Format::Array]);

    let owned = registry.get_virtual_column(USER, "owned").unwrap();
    assert!(owned.all);
    assert!(!owned.multiple);
    assert_eq!(owned.filter, Some(json!({"open": true})));
    assert_eq!(owned.formats(), &[Format::Array]);

    let row = registry.get_virtual_row(USER, &["*"]).unwrap();
    assert_eq!(row.names(), vec!["group", "groups", "owned"]);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_sealed_registry_rejects_declarations() {
    let mut registry = setup_registry();
    registry.seal();

    let err = registry.annotate(USER, "age", &integer()).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::RegistrySealed);
    assert!(err.code().is_declaration());

    let err = registry.annotate_type(GROUP, &entity("teams")).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::RegistrySealed);

    // Reads keep working
    assert_eq!(registry.get_storage_name(GROUP).unwrap(), "groups");
    assert_eq!(registry.get_primary_column(USER).unwrap().name(), "id");
}

/// Mutating a returned record or row does not affect the registry.
#[test]
fn test_reads_return_copies() {
    let registry = setup_registry();

    let mut record = registry.get_record(USER).unwrap();
    record.name = "changed".into();
    record.real.retain(|c| c.name() == "id");

    assert_eq!(registry.get_storage_name(USER).unwrap(), "users");
    assert_eq!(registry.get_real_row(USER, &["*"]).unwrap().len(), 5);
}

#[test]
fn test_unregistered_type() {
    let registry = setup_registry();
    let ghost = EntityType::named("Ghost");

    assert!(!registry.is_entity(ghost));
    let err = registry.get_primary_column(ghost).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::InvalidModel);
    assert_eq!(registry.entity_types(), vec![GROUP, USER]);
}

#[test]
fn test_describe_record() {
    let registry = setup_registry();
    let description = registry.describe(USER).unwrap();

    assert_eq!(description["name"], "users");
    assert_eq!(description["real"][2]["name"], "password");
    assert_eq!(description["real"][2]["write_only"], true);
    assert_eq!(description["real"][2]["hidden"], true);
}
