//! Quick SQL rendering
//!
//! A deterministic `CREATE TABLE` script built straight from the graph, with
//! no dialect handling. Dangling foreign keys render the resolver sentinels,
//! so this never fails.

use crate::graph::{FieldType, SchemaGraph, Table};
use crate::resolver::Resolver;

/// Render every table as a `CREATE TABLE` statement, separated by a blank line.
pub fn generate_legacy_sql(graph: &SchemaGraph) -> String {
    let resolver = Resolver::new(graph);
    graph
        .tables()
        .map(|table| create_table(table, &resolver))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn create_table(table: &Table, resolver: &Resolver<'_>) -> String {
    let mut lines = Vec::with_capacity(table.fields.len() + 1);
    let mut foreign_keys = Vec::new();
    let mut primary_keys = Vec::new();

    for field in &table.fields {
        let mut column = format!("  {} {}", field.name, field.field_type);
        if field.field_type == FieldType::Varchar {
            if let Some(length) = field.length.filter(|l| *l > 0) {
                column.push_str(&format!("({})", length));
            }
        }
        if field.is_required {
            column.push_str(" NOT NULL");
        }
        if field.is_unique {
            column.push_str(" UNIQUE");
        }
        if field.is_primary {
            primary_keys.push(field.name.as_str());
        }
        lines.push(column);

        if field.is_foreign {
            if let Some(ref reference) = field.foreign_ref {
                foreign_keys.push(format!(
                    "  FOREIGN KEY ({}) REFERENCES {}({})",
                    field.name,
                    resolver.table_name(&reference.node_id),
                    resolver.field_name(reference)
                ));
            }
        }
    }

    if !primary_keys.is_empty() {
        lines.push(format!("  PRIMARY KEY ({})", primary_keys.join(", ")));
    }
    lines.extend(foreign_keys);

    format!("CREATE TABLE {} (\n{}\n);", table.name, lines.join(",\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Field, ForeignRef, Position};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_table() {
        let mut graph = SchemaGraph::new();
        graph.add_table(
            Table::new("t1", Position::default())
                .with_name("users")
                .with_field(Field::new("f1").with_name("id").primary().required())
                .with_field(
                    Field::new("f2")
                        .with_name("email")
                        .with_type(FieldType::Varchar)
                        .with_length(Some(255))
                        .required()
                        .unique(),
                )
                .with_field(Field::new("f3").with_name("bio").with_type(FieldType::Text)),
        );

        let expected = "CREATE TABLE users (\n  id INTEGER NOT NULL,\n  email VARCHAR(255) NOT NULL UNIQUE,\n  bio TEXT,\n  PRIMARY KEY (id)\n);";
        assert_eq!(generate_legacy_sql(&graph), expected);
    }

    #[test]
    fn test_composite_primary_key_and_foreign_key() {
        let mut graph = SchemaGraph::new();
        graph.add_table(
            Table::new("t-users", Position::default())
                .with_name("users")
                .with_field(Field::new("u-id").with_name("id").primary()),
        );
        let mut link = Table::new("t-link", Position::default())
            .with_name("memberships")
            .with_field(Field::new("l-user").with_name("user_id").primary())
            .with_field(Field::new("l-group").with_name("group_id").primary());
        link.fields[0].is_foreign = true;
        link.fields[0].foreign_ref = Some(ForeignRef::new("t-users", "u-id"));
        graph.add_table(link);

        let expected = "CREATE TABLE users (\n  id INTEGER,\n  PRIMARY KEY (id)\n);\n\n\
CREATE TABLE memberships (\n  user_id INTEGER,\n  group_id INTEGER,\n  PRIMARY KEY (user_id, group_id),\n  FOREIGN KEY (user_id) REFERENCES users(id)\n);";
        assert_eq!(generate_legacy_sql(&graph), expected);
    }

    #[test]
    fn test_dangling_foreign_key_renders_sentinels() {
        let mut graph = SchemaGraph::new();
        let mut orders = Table::new("t-orders", Position::default())
            .with_name("orders")
            .with_field(Field::new("o-user").with_name("user_id"));
        orders.fields[0].is_foreign = true;
        orders.fields[0].foreign_ref = Some(ForeignRef::new("deleted", "gone"));
        graph.add_table(orders);

        let sql = generate_legacy_sql(&graph);
        assert!(sql.contains("FOREIGN KEY (user_id) REFERENCES UNKNOWN_TABLE(UNKNOWN_FIELD)"));
    }

    #[test]
    fn test_foreign_flag_without_reference_is_skipped() {
        let mut graph = SchemaGraph::new();
        let mut t = Table::new("t1", Position::default())
            .with_name("t")
            .with_field(Field::new("f1").with_name("a"));
        t.fields[0].is_foreign = true;
        graph.add_table(t);

        assert_eq!(generate_legacy_sql(&graph), "CREATE TABLE t (\n  a INTEGER\n);");
    }

    #[test]
    fn test_varchar_without_length() {
        let mut graph = SchemaGraph::new();
        graph.add_table(
            Table::new("t1", Position::default())
                .with_name("t")
                .with_field(Field::new("f1").with_name("code").with_type(FieldType::Varchar)),
        );
        assert_eq!(generate_legacy_sql(&graph), "CREATE TABLE t (\n  code VARCHAR\n);");
    }

    #[test]
    fn test_empty_table_and_empty_graph() {
        assert_eq!(generate_legacy_sql(&SchemaGraph::new()), "");

        let mut graph = SchemaGraph::new();
        graph.add_table(Table::new("t1", Position::default()));
        assert_eq!(generate_legacy_sql(&graph), "CREATE TABLE New Table (\n\n);");
    }
}
