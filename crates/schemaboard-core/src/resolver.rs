//! Reference resolution
//!
//! Turns table ids and `{nodeId, fieldId}` references into display names, and
//! keeps derived relationship names in step with table renames.
//!
//! Lookups never fail: a reference to a table or field that no longer exists
//! resolves to the `UNKNOWN_TABLE` / `UNKNOWN_FIELD` sentinel so that export
//! and SQL rendering stay total for any graph state.

use tracing::debug;

use crate::graph::{ForeignRef, SchemaGraph};

/// Sentinel returned for a table id that is not in the graph
pub const UNKNOWN_TABLE: &str = "UNKNOWN_TABLE";

/// Sentinel returned for a field reference that cannot be resolved
pub const UNKNOWN_FIELD: &str = "UNKNOWN_FIELD";

/// Placeholder for a missing source table in a derived relationship name
const PLACEHOLDER_SOURCE: &str = "table1";

/// Placeholder for a missing target table in a derived relationship name
const PLACEHOLDER_TARGET: &str = "table2";

/// Read-only name lookups over a graph snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    graph: &'a SchemaGraph,
}

impl<'a> Resolver<'a> {
    pub fn new(graph: &'a SchemaGraph) -> Self {
        Self { graph }
    }

    /// Display name of a table, or `UNKNOWN_TABLE`.
    ///
    /// An empty name counts as unknown.
    pub fn table_name(&self, table_id: &str) -> &'a str {
        self.graph
            .table(table_id)
            .map(|t| t.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_TABLE)
    }

    /// Name of the referenced field, or `UNKNOWN_FIELD`.
    pub fn field_name(&self, reference: &ForeignRef) -> &'a str {
        self.graph
            .table(&reference.node_id)
            .and_then(|t| t.field(&reference.field_id))
            .map(|f| f.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_FIELD)
    }

    /// `<source>_<target>` from the current table names.
    ///
    /// A side whose table is missing (or unnamed) is written as `table1` /
    /// `table2`, matching what the canvas shows for a half-resolved edge.
    pub fn default_relationship_name(&self, source_id: &str, target_id: &str) -> String {
        let source = self.name_or(source_id, PLACEHOLDER_SOURCE);
        let target = self.name_or(target_id, PLACEHOLDER_TARGET);
        format!("{}_{}", source, target)
    }

    fn name_or(&self, table_id: &str, fallback: &'a str) -> &'a str {
        self.graph
            .table(table_id)
            .map(|t| t.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(fallback)
    }
}

/// Rename a table and rewrite the name of every relationship touching it.
///
/// Each touching edge gets `<source>_<target>` with `new_name` on the renamed
/// side (both sides for a self-referencing edge) and the other side's current
/// name. The rewrite is unconditional: a name the user set by hand is
/// overwritten too.
///
/// Returns the number of relationships rewritten, or `None` when the table
/// does not exist (nothing changes).
pub fn rename_table(graph: &mut SchemaGraph, table_id: &str, new_name: &str) -> Option<usize> {
    if !graph.update_table(table_id, |t| t.with_name(new_name)) {
        return None;
    }

    let renames: Vec<(String, String)> = {
        let resolver = Resolver::new(graph);
        graph
            .relationships_touching(table_id)
            .map(|r| {
                let source = if r.source == table_id {
                    new_name
                } else {
                    resolver.name_or(&r.source, PLACEHOLDER_SOURCE)
                };
                let target = if r.target == table_id {
                    new_name
                } else {
                    resolver.name_or(&r.target, PLACEHOLDER_TARGET)
                };
                (r.id.clone(), format!("{}_{}", source, target))
            })
            .collect()
    };

    for (edge_id, name) in &renames {
        graph.update_relationship(edge_id, |r| r.clone().with_name(name.clone()));
    }

    debug!(
        "Renamed table {} to '{}', {} relationship name(s) rewritten",
        table_id,
        new_name,
        renames.len()
    );
    Some(renames.len())
}
