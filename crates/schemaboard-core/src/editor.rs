//! Relationship editor workflow
//!
//! Opened on an edge, the editor keeps local copies of the cardinality and
//! name. Nothing reaches the graph until `save`; dropping or cancelling the
//! editor discards the edits.

use tracing::debug;

use crate::connection::{field_id_from_source_handle, field_id_from_target_handle};
use crate::graph::{ForeignRef, RelationType, SchemaGraph, UNNAMED_RELATION};
use crate::resolver::Resolver;

/// Local edit state for one relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipEditor {
    edge_id: String,
    relationship: RelationType,
    name: String,
}

impl RelationshipEditor {
    /// Load the current cardinality and name of `edge_id`.
    ///
    /// When the edge has no stored name, one is synthesized from the current
    /// table names if both endpoint tables exist; otherwise the name starts
    /// out empty. Returns `None` for an unknown edge.
    pub fn open(graph: &SchemaGraph, edge_id: &str) -> Option<Self> {
        let edge = graph.relationship(edge_id)?;

        let name = match edge.relationship_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ if graph.contains_table(&edge.source) && graph.contains_table(&edge.target) => {
                Resolver::new(graph).default_relationship_name(&edge.source, &edge.target)
            }
            _ => String::new(),
        };

        Some(Self {
            edge_id: edge_id.to_string(),
            relationship: edge.relationship,
            name,
        })
    }

    pub fn edge_id(&self) -> &str {
        &self.edge_id
    }

    pub fn relationship(&self) -> RelationType {
        self.relationship
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_relationship(&mut self, relationship: RelationType) {
        self.relationship = relationship;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Discard the local edits.
    pub fn cancel(self) {
        debug!("Relationship edit for {} cancelled", self.edge_id);
    }

    /// Write the edits back.
    ///
    /// The edge receives the selected cardinality and the trimmed name
    /// (`unnamed_relation` when blank). If the edge carries both handles, the
    /// matching field of the target table is then marked as a foreign key with
    /// this cardinality and a reference to the source field.
    ///
    /// Returns `false` (and changes nothing) when the edge no longer exists.
    pub fn save(self, graph: &mut SchemaGraph) -> bool {
        let trimmed = self.name.trim();
        let name = if trimmed.is_empty() {
            UNNAMED_RELATION.to_string()
        } else {
            trimmed.to_string()
        };
        let relationship = self.relationship;

        if !graph.update_relationship(&self.edge_id, |edge| {
            edge.clone()
                .with_relationship(relationship)
                .with_name(name.clone())
        }) {
            return false;
        }

        let Some(edge) = graph.relationship(&self.edge_id) else {
            return false;
        };
        let (Some(source_handle), Some(target_handle)) =
            (edge.source_handle.as_deref(), edge.target_handle.as_deref())
        else {
            debug!(
                "Relationship {} has no field handles, skipping field update",
                self.edge_id
            );
            return true;
        };
        if edge.source.is_empty() || edge.target.is_empty() {
            return true;
        }

        let source = edge.source.clone();
        let target = edge.target.clone();
        let source_field_id = field_id_from_source_handle(source_handle).to_string();
        let target_field_id = field_id_from_target_handle(target_handle).to_string();

        graph.update_table(&target, |table| {
            let mut next = table.clone();
            for field in next.fields.iter_mut().filter(|f| f.id == target_field_id) {
                field.is_foreign = true;
                field.relation_type = Some(relationship);
                field.foreign_ref = Some(ForeignRef::new(source.clone(), source_field_id.clone()));
            }
            next
        });

        debug!(
            "Saved relationship {} as {} '{}'",
            self.edge_id, relationship, name
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{connect, Connection};
    use crate::graph::{Field, Position, Relationship, SequentialIds, Table};
    use pretty_assertions::assert_eq;

    fn connected_graph() -> (SchemaGraph, String) {
        let mut graph = SchemaGraph::new();
        graph.add_table(
            Table::new("t-users", Position::default())
                .with_name("users")
                .with_field(Field::new("u-id").with_name("id").primary()),
        );
        graph.add_table(
            Table::new("t-orders", Position::default())
                .with_name("orders")
                .with_field(Field::new("o-id").with_name("id"))
                .with_field(Field::new("o-user").with_name("user_id")),
        );
        let edge_id = connect(
            &mut graph,
            &Connection::between_fields("t-users", "u-id", "t-orders", "o-user"),
            &mut SequentialIds::new("e"),
        )
        .unwrap();
        (graph, edge_id)
    }

    #[test]
    fn test_open_loads_current_values() {
        let (graph, edge_id) = connected_graph();
        let editor = RelationshipEditor::open(&graph, &edge_id).unwrap();
        assert_eq!(editor.relationship(), RelationType::OneToOne);
        assert_eq!(editor.name(), "users_orders");
        assert_eq!(editor.edge_id(), edge_id);
    }

    #[test]
    fn test_open_unknown_edge() {
        let (graph, _) = connected_graph();
        assert!(RelationshipEditor::open(&graph, "missing").is_none());
    }

    #[test]
    fn test_open_synthesizes_missing_name() {
        let (mut graph, _) = connected_graph();
        graph.add_relationship(Relationship::new("bare", "t-orders", "t-users"));

        let editor = RelationshipEditor::open(&graph, "bare").unwrap();
        assert_eq!(editor.name(), "orders_users");
    }

    #[test]
    fn test_open_dangling_edge_without_name() {
        let (mut graph, _) = connected_graph();
        graph.add_relationship(Relationship::new("bare", "gone", "t-users"));

        let editor = RelationshipEditor::open(&graph, "bare").unwrap();
        assert_eq!(editor.name(), "");
    }

    #[test]
    fn test_save_updates_edge_and_target_field() {
        let (mut graph, edge_id) = connected_graph();
        let mut editor = RelationshipEditor::open(&graph, &edge_id).unwrap();
        editor.set_relationship(RelationType::OneToMany);
        editor.set_name("  placed_by  ");

        assert!(editor.save(&mut graph));

        let edge = graph.relationship(&edge_id).unwrap();
        assert_eq!(edge.relationship, RelationType::OneToMany);
        assert_eq!(edge.relationship_name.as_deref(), Some("placed_by"));

        let fk = graph.table("t-orders").unwrap().field("o-user").unwrap();
        assert!(fk.is_foreign);
        assert_eq!(fk.relation_type, Some(RelationType::OneToMany));
        assert_eq!(fk.foreign_ref, Some(ForeignRef::new("t-users", "u-id")));

        let other = graph.table("t-orders").unwrap().field("o-id").unwrap();
        assert_eq!(other.relation_type, None);
    }

    #[test]
    fn test_save_blank_name_falls_back() {
        let (mut graph, edge_id) = connected_graph();
        let mut editor = RelationshipEditor::open(&graph, &edge_id).unwrap();
        editor.set_name("   ");
        editor.save(&mut graph);

        assert_eq!(
            graph.relationship(&edge_id).unwrap().relationship_name.as_deref(),
            Some(UNNAMED_RELATION)
        );
    }

    #[test]
    fn test_cancel_leaves_graph_untouched() {
        let (graph, edge_id) = connected_graph();
        let before = graph.clone();

        let mut editor = RelationshipEditor::open(&graph, &edge_id).unwrap();
        editor.set_relationship(RelationType::ManyToMany);
        editor.set_name("something_else");
        editor.cancel();

        assert_eq!(graph, before);
    }

    #[test]
    fn test_save_after_edge_removed() {
        let (mut graph, edge_id) = connected_graph();
        let editor = RelationshipEditor::open(&graph, &edge_id).unwrap();
        graph.remove_relationship(&edge_id);
        let before = graph.clone();

        assert!(!editor.save(&mut graph));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_save_without_handles_skips_fields() {
        let (mut graph, _) = connected_graph();
        graph.add_relationship(Relationship::new("bare", "t-users", "t-orders"));
        let tables_before: Vec<_> = graph.tables().cloned().collect();

        let mut editor = RelationshipEditor::open(&graph, "bare").unwrap();
        editor.set_relationship(RelationType::ManyToMany);
        assert!(editor.save(&mut graph));

        assert_eq!(
            graph.relationship("bare").unwrap().relationship,
            RelationType::ManyToMany
        );
        let tables_after: Vec<_> = graph.tables().cloned().collect();
        assert_eq!(tables_before, tables_after);
    }
}
