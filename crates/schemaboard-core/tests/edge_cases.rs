//! Edge case tests: dangling references, malformed documents, naming defaults.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --package schemaboard-core --test edge_cases
//! ```

mod common;

use std::sync::Arc;

use chrono::Utc;
use pretty_assertions::assert_eq;
use schemaboard_core::{
    export_document, generate_legacy_sql, Command, Connection, ImportError, RelationType,
    SessionEvent, UNKNOWN_FIELD, UNKNOWN_TABLE,
};

use common::{add_field, add_table, named, new_session, shop};

// ============================================================================
// Dangling References
// ============================================================================

#[test]
fn test_deleted_table_renders_sentinels() {
    let mut session = new_session(1);
    let ids = shop(&mut session);

    session.apply(Command::DeleteTable {
        table_id: ids.users.clone(),
    });

    let sql = generate_legacy_sql(session.graph());
    assert!(sql.contains(&format!(
        "FOREIGN KEY (user_id) REFERENCES {}({})",
        UNKNOWN_TABLE, UNKNOWN_FIELD
    )));
    assert!(!sql.contains("CREATE TABLE users"));
}

#[test]
fn test_removed_field_renders_field_sentinel() {
    let mut session = new_session(2);
    let ids = shop(&mut session);

    session.apply(Command::RemoveField {
        table_id: ids.users.clone(),
        field_id: ids.user_id.clone(),
    });

    let sql = generate_legacy_sql(session.graph());
    assert!(sql.contains(&format!("REFERENCES users({})", UNKNOWN_FIELD)));
}

#[test]
fn test_dangling_edges_still_export() {
    let mut session = new_session(3);
    let ids = shop(&mut session);
    session.apply(Command::DeleteTable {
        table_id: ids.orders.clone(),
    });

    let doc = export_document(session.graph(), session.project_name(), Utc::now());
    assert_eq!(doc.schema.len(), 1);
    assert_eq!(doc.edges.len(), 1);
    assert_eq!(doc.edges[0].target, ids.orders);
}

#[test]
fn test_rename_with_dangling_side_uses_placeholder() {
    let mut session = new_session(4);
    let ids = shop(&mut session);
    session.apply(Command::DeleteTable {
        table_id: ids.users.clone(),
    });
    session.apply(Command::RenameTable {
        table_id: ids.orders.clone(),
        name: "purchases".into(),
    });

    assert_eq!(
        session
            .graph()
            .relationship(&ids.edge)
            .unwrap()
            .relationship_name
            .as_deref(),
        Some("table1_purchases")
    );
}

// ============================================================================
// Malformed Documents
// ============================================================================

#[test]
fn test_malformed_import_leaves_graph() {
    let mut session = new_session(5);
    shop(&mut session);
    let before = session.snapshot();

    for text in [
        r#"{"schema": "not-an-array", "edges": []}"#,
        r#"{"schema": [], "edges": {}}"#,
        r#"{"edges": []}"#,
        r#"[]"#,
        "not json at all",
    ] {
        let result = session.import_text(text);
        assert!(result.is_err(), "accepted {}", text);
        assert!(Arc::ptr_eq(&before, &session.snapshot()));
    }
    assert_eq!(session.project_name(), "Shop");
}

#[test]
fn test_malformed_import_error_kinds() {
    let mut session = new_session(6);

    assert!(matches!(
        session.import_text(r#"{"schema": "x", "edges": []}"#),
        Err(ImportError::InvalidShape { member: "schema" })
    ));
    assert!(matches!(
        session.import_text("{"),
        Err(ImportError::Parse(_))
    ));
    assert!(matches!(
        session.import_text(r#"{"schema": [], "edges": [{"id": "e", "source": "a"}]}"#),
        Err(ImportError::InvalidRecord { .. })
    ));
}

#[test]
fn test_hand_edited_document_imports_with_defaults() {
    let mut session = new_session(7);
    let text = r#"{
        "schema": [
            { "id": "t1", "tableName": "users", "position": {"x": 10.25, "y": 20.5},
              "fields": [
                { "id": "f1", "name": "id", "type": "MONEY", "isPrimary": true },
                { "id": "f2", "name": "email", "type": "VARCHAR", "length": -5 },
                { "id": "f3", "name": "nick", "type": "VARCHAR", "length": "abc" }
              ] },
            { "id": "t2", "tableName": "orders",
              "fields": [
                { "id": "f4", "name": "user_id", "isForeign": true,
                  "foreignRef": {"nodeId": "t1"}, "relationType": "sometimes" },
                { "id": "f5", "name": "ghost_id", "isForeign": true,
                  "foreignRef": {"fieldId": "f1"} }
              ] }
        ],
        "edges": [ { "id": "e1", "source": "t1", "target": "t2",
                     "data": {"relationship": "2:2", "relationshipName": "users_orders"} } ]
    }"#;

    session.import_text(text).unwrap();

    let expected = "CREATE TABLE users (\n  id INTEGER,\n  email VARCHAR,\n  nick VARCHAR,\n  PRIMARY KEY (id)\n);\n\n\
CREATE TABLE orders (\n  user_id INTEGER,\n  ghost_id INTEGER,\n  FOREIGN KEY (user_id) REFERENCES users(UNKNOWN_FIELD),\n  FOREIGN KEY (ghost_id) REFERENCES UNKNOWN_TABLE(UNKNOWN_FIELD)\n);";
    assert_eq!(generate_legacy_sql(session.graph()), expected);

    let edge = session.graph().relationship("e1").unwrap();
    assert_eq!(edge.relationship, RelationType::OneToOne);
    let user_id = &session.graph().table("t2").unwrap().fields[0];
    assert_eq!(user_id.relation_type, None);
}

// ============================================================================
// Naming Defaults
// ============================================================================

#[test]
fn test_connect_default_name_and_cardinality() {
    let mut session = new_session(7);
    let users = add_table(&mut session, "users");
    let orders = add_table(&mut session, "orders");
    let a = add_field(&mut session, &users, named("id"));
    let b = add_field(&mut session, &orders, named("user_id"));

    let events = session.apply(Command::Connect(Connection::between_fields(
        users.clone(),
        &a,
        orders.clone(),
        &b,
    )));
    let [SessionEvent::Connected { edge_id }] = events.as_slice() else {
        panic!("unexpected events: {:?}", events);
    };

    let edge = session.graph().relationship(edge_id).unwrap();
    assert_eq!(edge.relationship.as_str(), "1:1");
    assert_eq!(edge.relationship_name.as_deref(), Some("users_orders"));
    assert_eq!(session.graph().relationship_count(), 1);
}

#[test]
fn test_rename_propagates_to_every_touching_edge() {
    let mut session = new_session(8);
    let ids = shop(&mut session);
    let audit = add_table(&mut session, "audit");
    session.apply(Command::Connect(Connection {
        source: Some(audit.clone()),
        target: Some(ids.users.clone()),
        ..Default::default()
    }));

    let events = session.apply(Command::RenameTable {
        table_id: ids.users.clone(),
        name: "customers".into(),
    });
    assert!(matches!(
        events.as_slice(),
        [SessionEvent::TableRenamed { relationships_renamed: 2, .. }]
    ));

    let names: Vec<_> = session
        .graph()
        .relationships()
        .map(|r| r.display_name().to_string())
        .collect();
    assert_eq!(names, vec!["customers_orders", "audit_customers"]);
}

#[test]
fn test_blank_relationship_name_saved_as_unnamed() {
    let mut session = new_session(9);
    let ids = shop(&mut session);
    session.apply(Command::SaveRelationship {
        edge_id: ids.edge.clone(),
        relationship: RelationType::ManyToMany,
        name: "  ".into(),
    });

    let doc = export_document(session.graph(), session.project_name(), Utc::now());
    assert_eq!(doc.edges[0].data.relationship_name, "unnamed_relation");
}
