//! Connection rules for drag-to-connect gestures
//!
//! A connection names a source table/handle and a target table/handle.
//! Handles are field ids with a direction suffix: `<field>-out` on the source
//! side, `<field>-in` on the target side.

use tracing::{debug, trace};

use crate::graph::{ForeignRef, IdSource, RelationType, Relationship, SchemaGraph};
use crate::resolver::Resolver;

/// Suffix of a source (outgoing) handle
pub const SOURCE_HANDLE_SUFFIX: &str = "-out";

/// Suffix of a target (incoming) handle
pub const TARGET_HANDLE_SUFFIX: &str = "-in";

/// Outgoing handle id for a field
pub fn source_handle_for(field_id: &str) -> String {
    format!("{}{}", field_id, SOURCE_HANDLE_SUFFIX)
}

/// Incoming handle id for a field
pub fn target_handle_for(field_id: &str) -> String {
    format!("{}{}", field_id, TARGET_HANDLE_SUFFIX)
}

/// Field id behind a source handle. A handle without the suffix is taken as is.
pub fn field_id_from_source_handle(handle: &str) -> &str {
    handle.strip_suffix(SOURCE_HANDLE_SUFFIX).unwrap_or(handle)
}

/// Field id behind a target handle. A handle without the suffix is taken as is.
pub fn field_id_from_target_handle(handle: &str) -> &str {
    handle.strip_suffix(TARGET_HANDLE_SUFFIX).unwrap_or(handle)
}

/// A proposed edge, as reported by the diagram surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connection {
    pub source: Option<String>,
    pub source_handle: Option<String>,
    pub target: Option<String>,
    pub target_handle: Option<String>,
}

impl Connection {
    /// Connection between two fields, handles derived from the field ids
    pub fn between_fields(
        source: impl Into<String>,
        source_field: &str,
        target: impl Into<String>,
        target_field: &str,
    ) -> Self {
        Self {
            source: Some(source.into()),
            source_handle: Some(source_handle_for(source_field)),
            target: Some(target.into()),
            target_handle: Some(target_handle_for(target_field)),
        }
    }

    /// True when none of the four endpoints is set
    pub fn is_empty(&self) -> bool {
        self.source.is_none()
            && self.source_handle.is_none()
            && self.target.is_none()
            && self.target_handle.is_none()
    }
}

/// Apply a connect gesture.
///
/// Creates a `1:1` relationship named `<source>_<target>` and marks the target
/// field (the one whose `-in` handle matches) as a foreign key pointing at the
/// source field. No check is made for self-loops, cardinality conflicts or an
/// existing edge between the same fields; each connect adds a new edge.
///
/// Returns the new relationship id, or `None` when the gesture was incomplete
/// (no endpoints at all, or a missing source/target table id). Incomplete
/// gestures leave the graph untouched.
pub fn connect<I: IdSource + ?Sized>(
    graph: &mut SchemaGraph,
    connection: &Connection,
    ids: &mut I,
) -> Option<String> {
    if connection.is_empty() {
        trace!("Ignoring empty connection");
        return None;
    }
    let (Some(source), Some(target)) = (connection.source.as_deref(), connection.target.as_deref())
    else {
        trace!("Ignoring connection without both endpoints: {:?}", connection);
        return None;
    };

    let name = Resolver::new(graph).default_relationship_name(source, target);
    let edge_id = ids.next_id();

    graph.add_relationship(
        Relationship::new(edge_id.clone(), source, target)
            .with_handles(
                connection.source_handle.clone(),
                connection.target_handle.clone(),
            )
            .with_relationship(RelationType::OneToOne)
            .with_name(name.clone()),
    );

    if let (Some(source_handle), Some(target_handle)) = (
        connection.source_handle.as_deref(),
        connection.target_handle.as_deref(),
    ) {
        let foreign_ref = ForeignRef::new(source, field_id_from_source_handle(source_handle));
        mark_foreign(graph, target, target_handle, foreign_ref);
    }

    debug!("Connected {} -> {} as '{}' ({})", source, target, name, edge_id);
    Some(edge_id)
}

/// Remove a relationship edge. Field metadata on either side is left as is.
pub fn disconnect(graph: &mut SchemaGraph, edge_id: &str) -> bool {
    let removed = graph.remove_relationship(edge_id).is_some();
    if removed {
        debug!("Disconnected relationship {}", edge_id);
    }
    removed
}

/// Flag the field behind `target_handle` in `table_id` as a foreign key.
fn mark_foreign(graph: &mut SchemaGraph, table_id: &str, target_handle: &str, foreign_ref: ForeignRef) {
    graph.update_table(table_id, |table| {
        let mut next = table.clone();
        for field in next.fields.iter_mut() {
            if target_handle_for(&field.id) == target_handle {
                field.is_foreign = true;
                field.foreign_ref = Some(foreign_ref.clone());
            }
        }
        next
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Field, Position, SequentialIds, Table};
    use pretty_assertions::assert_eq;

    fn users_orders() -> SchemaGraph {
        let mut graph = SchemaGraph::new();
        graph.add_table(
            Table::new("t-users", Position::default())
                .with_name("users")
                .with_field(Field::new("u-id").with_name("id").primary()),
        );
        graph.add_table(
            Table::new("t-orders", Position::default())
                .with_name("orders")
                .with_field(Field::new("o-id").with_name("id").primary())
                .with_field(Field::new("o-user").with_name("user_id")),
        );
        graph
    }

    #[test]
    fn test_handle_helpers() {
        assert_eq!(source_handle_for("f1"), "f1-out");
        assert_eq!(target_handle_for("f1"), "f1-in");
        assert_eq!(field_id_from_source_handle("f1-out"), "f1");
        assert_eq!(field_id_from_target_handle("f1-in"), "f1");
        assert_eq!(field_id_from_source_handle("plain"), "plain");
        // Only the trailing suffix is stripped
        assert_eq!(field_id_from_source_handle("a-out-b-out"), "a-out-b");
    }

    #[test]
    fn test_connect_default_naming() {
        let mut graph = users_orders();
        let mut ids = SequentialIds::new("e");

        let conn = Connection::between_fields("t-users", "u-id", "t-orders", "o-user");
        let edge_id = connect(&mut graph, &conn, &mut ids).unwrap();

        let edge = graph.relationship(&edge_id).unwrap();
        assert_eq!(edge.relationship, RelationType::OneToOne);
        assert_eq!(edge.relationship_name.as_deref(), Some("users_orders"));
        assert_eq!(edge.source_handle.as_deref(), Some("u-id-out"));
        assert_eq!(edge.target_handle.as_deref(), Some("o-user-in"));
        assert_eq!(graph.relationship_count(), 1);
    }

    #[test]
    fn test_connect_marks_only_target_field() {
        let mut graph = users_orders();
        let conn = Connection::between_fields("t-users", "u-id", "t-orders", "o-user");
        connect(&mut graph, &conn, &mut SequentialIds::new("e"));

        let orders = graph.table("t-orders").unwrap();
        let fk = orders.field("o-user").unwrap();
        assert!(fk.is_foreign);
        assert_eq!(fk.foreign_ref, Some(ForeignRef::new("t-users", "u-id")));

        let pk = orders.field("o-id").unwrap();
        assert!(!pk.is_foreign);
        assert_eq!(pk.foreign_ref, None);

        let users = graph.table("t-users").unwrap();
        assert!(!users.field("u-id").unwrap().is_foreign);
    }

    #[test]
    fn test_connect_empty_is_noop() {
        let mut graph = users_orders();
        let before = graph.clone();
        let result = connect(&mut graph, &Connection::default(), &mut SequentialIds::new("e"));
        assert!(result.is_none());
        assert_eq!(graph, before);
    }

    #[test]
    fn test_connect_without_target_is_noop() {
        let mut graph = users_orders();
        let before = graph.clone();
        let conn = Connection {
            source: Some("t-users".into()),
            source_handle: Some("u-id-out".into()),
            target: None,
            target_handle: Some("o-user-in".into()),
        };
        assert!(connect(&mut graph, &conn, &mut SequentialIds::new("e")).is_none());
        assert_eq!(graph, before);
    }

    #[test]
    fn test_connect_without_handles_adds_edge_only() {
        let mut graph = users_orders();
        let conn = Connection {
            source: Some("t-users".into()),
            target: Some("t-orders".into()),
            ..Default::default()
        };
        let edge_id = connect(&mut graph, &conn, &mut SequentialIds::new("e")).unwrap();

        assert!(graph.relationship(&edge_id).is_some());
        assert!(graph
            .table("t-orders")
            .unwrap()
            .fields
            .iter()
            .all(|f| !f.is_foreign));
    }

    #[test]
    fn test_duplicate_connections_are_tracked_separately() {
        let mut graph = users_orders();
        let mut ids = SequentialIds::new("e");
        let conn = Connection::between_fields("t-users", "u-id", "t-orders", "o-user");

        let first = connect(&mut graph, &conn, &mut ids).unwrap();
        let second = connect(&mut graph, &conn, &mut ids).unwrap();

        assert_ne!(first, second);
        assert_eq!(graph.relationship_count(), 2);
    }

    #[test]
    fn test_latest_connection_wins_on_target_field() {
        let mut graph = users_orders();
        let mut ids = SequentialIds::new("e");

        connect(
            &mut graph,
            &Connection::between_fields("t-users", "u-id", "t-orders", "o-user"),
            &mut ids,
        );
        connect(
            &mut graph,
            &Connection::between_fields("t-orders", "o-id", "t-orders", "o-user"),
            &mut ids,
        );

        let fk = graph.table("t-orders").unwrap().field("o-user").unwrap();
        assert_eq!(fk.foreign_ref, Some(ForeignRef::new("t-orders", "o-id")));
    }

    #[test]
    fn test_connect_to_unknown_tables_uses_placeholders() {
        let mut graph = SchemaGraph::new();
        let conn = Connection::between_fields("a", "f1", "b", "f2");
        let edge_id = connect(&mut graph, &conn, &mut SequentialIds::new("e")).unwrap();
        assert_eq!(
            graph.relationship(&edge_id).unwrap().relationship_name.as_deref(),
            Some("table1_table2")
        );
    }

    #[test]
    fn test_disconnect_keeps_field_metadata() {
        let mut graph = users_orders();
        let conn = Connection::between_fields("t-users", "u-id", "t-orders", "o-user");
        let edge_id = connect(&mut graph, &conn, &mut SequentialIds::new("e")).unwrap();

        assert!(disconnect(&mut graph, &edge_id));
        assert!(!disconnect(&mut graph, &edge_id));
        assert_eq!(graph.relationship_count(), 0);
        assert!(graph.table("t-orders").unwrap().field("o-user").unwrap().is_foreign);
    }
}
