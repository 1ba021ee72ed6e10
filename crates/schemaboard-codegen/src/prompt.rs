//! Prompt construction
//!
//! The prompt is plain text in four parts: the dialect system prompt, a
//! description of every table and field, one line per relationship, and a
//! fixed block of output instructions.

use schemaboard_core::{FieldRecord, TableRecord};

use crate::provider::CodeGenerationRequest;

/// Stand-in for an edge endpoint that matches no table
const UNKNOWN_ENDPOINT: &str = "unknown";

/// Build the full prompt text for a request.
pub fn build_prompt(request: &CodeGenerationRequest) -> String {
    let db = request.database_type.as_str();

    let schema_description = request
        .schema
        .iter()
        .map(describe_table)
        .collect::<Vec<_>>()
        .join("\n\n");

    let relationships_description = request
        .edges
        .iter()
        .map(|edge| {
            let source = table_name(&request.schema, &edge.source);
            let target = table_name(&request.schema, &edge.target);
            let name = if edge.data.relationship_name.is_empty() {
                format!("{}_{}", source, target)
            } else {
                edge.data.relationship_name.clone()
            };
            format!(
                "Relationship: {} ({} -> {}, Type: {})",
                name, source, target, edge.data.relationship
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let additional = match request.custom_prompt.as_deref() {
        Some(custom) if !custom.is_empty() => format!("ADDITIONAL REQUIREMENTS:\n{}\n", custom),
        _ => String::new(),
    };

    format!(
        "{system}\n\n\
SCHEMA DEFINITION:\n{schema}\n\n\
RELATIONSHIPS:\n{relationships}\n\n\
{additional}\n\n\
IMPORTANT: Generate ONLY the {upper} code. Do not include any explanations, descriptions, or markdown formatting. Start directly with the code.\n\n\
Requirements:\n\
- All table creation statements\n\
- Proper data types for {db}\n\
- Primary key constraints\n\
- Foreign key relationships\n\
- Indexes for optimal performance\n\
- {db}-specific optimizations\n\n\
Return only executable code without any additional text.",
        system = request.database_type.system_prompt(),
        schema = schema_description,
        relationships = relationships_description,
        additional = additional,
        upper = db.to_uppercase(),
        db = db,
    )
}

fn describe_table(table: &TableRecord) -> String {
    let fields = table
        .fields
        .iter()
        .map(describe_field)
        .collect::<Vec<_>>()
        .join("\n");
    format!("Table: {}\n{}", table.table_name, fields)
}

fn describe_field(field: &FieldRecord) -> String {
    let mut props = Vec::new();
    if field.is_primary {
        props.push("PRIMARY KEY".to_string());
    }
    if field.is_required {
        props.push("NOT NULL".to_string());
    }
    if field.is_unique {
        props.push("UNIQUE".to_string());
    }
    if field.is_foreign {
        props.push("FOREIGN KEY".to_string());
    }
    if let Some(length) = field.length.filter(|l| *l > 0) {
        props.push(format!("LENGTH({})", length));
    }

    if props.is_empty() {
        format!("  - {}: {}", field.name, field.field_type)
    } else {
        format!("  - {}: {} ({})", field.name, field.field_type, props.join(", "))
    }
}

fn table_name<'a>(schema: &'a [TableRecord], id: &str) -> &'a str {
    schema
        .iter()
        .find(|t| t.id == id)
        .map(|t| t.table_name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_ENDPOINT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::DatabaseType;
    use pretty_assertions::assert_eq;
    use schemaboard_core::{
        Field, FieldType, Position, RelationType, Relationship, SchemaGraph, Table,
    };

    fn shop_graph() -> SchemaGraph {
        let mut graph = SchemaGraph::new();
        graph.add_table(
            Table::new("t-users", Position::default())
                .with_name("users")
                .with_field(Field::new("u-id").with_name("id").primary().required())
                .with_field(
                    Field::new("u-email")
                        .with_name("email")
                        .with_type(FieldType::Varchar)
                        .with_length(Some(255))
                        .unique(),
                ),
        );
        let mut orders = Table::new("t-orders", Position::default())
            .with_name("orders")
            .with_field(Field::new("o-user").with_name("user_id"));
        orders.fields[0].is_foreign = true;
        graph.add_table(orders);
        graph.add_relationship(
            Relationship::new("e1", "t-users", "t-orders")
                .with_relationship(RelationType::OneToMany)
                .with_name("users_orders"),
        );
        graph
    }

    #[test]
    fn test_schema_and_relationship_sections() {
        let request = CodeGenerationRequest::from_graph(DatabaseType::Postgresql, &shop_graph());
        let prompt = build_prompt(&request);

        let expected_schema = "SCHEMA DEFINITION:\n\
Table: users\n  - id: INTEGER (PRIMARY KEY, NOT NULL)\n  - email: VARCHAR (UNIQUE, LENGTH(255))\n\n\
Table: orders\n  - user_id: INTEGER (FOREIGN KEY)\n\n";
        assert!(prompt.contains(expected_schema), "{}", prompt);
        assert!(prompt.contains(
            "RELATIONSHIPS:\nRelationship: users_orders (users -> orders, Type: 1:N)\n\n"
        ));
        assert!(prompt.starts_with(DatabaseType::Postgresql.system_prompt()));
    }

    #[test]
    fn test_closing_instructions_name_dialect() {
        let request = CodeGenerationRequest::new(DatabaseType::Mysql, vec![], vec![]);
        let prompt = build_prompt(&request);

        assert!(prompt.contains("IMPORTANT: Generate ONLY the MYSQL code."));
        assert!(prompt.contains("- Proper data types for mysql\n"));
        assert!(prompt.contains("- mysql-specific optimizations\n\n"));
        assert!(prompt.ends_with("Return only executable code without any additional text."));
    }

    #[test]
    fn test_empty_request_layout() {
        let request = CodeGenerationRequest::new(DatabaseType::Sql, vec![], vec![]);
        let prompt = build_prompt(&request);
        let expected_middle = "\n\nSCHEMA DEFINITION:\n\n\nRELATIONSHIPS:\n\n\n\n\nIMPORTANT:";
        assert!(prompt.contains(expected_middle), "{:?}", prompt);
    }

    #[test]
    fn test_custom_prompt_section() {
        let request = CodeGenerationRequest::new(DatabaseType::Sql, vec![], vec![])
            .with_custom_prompt("Use snake_case");
        let prompt = build_prompt(&request);
        assert!(prompt.contains("\n\nADDITIONAL REQUIREMENTS:\nUse snake_case\n\n\nIMPORTANT:"));
    }

    #[test]
    fn test_unknown_endpoints() {
        let mut graph = shop_graph();
        graph.add_relationship(Relationship::new("e2", "gone", "t-orders"));
        let request = CodeGenerationRequest::from_graph(DatabaseType::Sql, &graph);
        let prompt = build_prompt(&request);

        // unnamed edges export as unnamed_relation, so the stored name wins
        assert!(prompt.contains("Relationship: unnamed_relation (unknown -> orders, Type: 1:1)"));
    }

    #[test]
    fn test_blank_relationship_name_falls_back_to_table_pair() {
        let mut request = CodeGenerationRequest::from_graph(DatabaseType::Sql, &shop_graph());
        request.edges[0].data.relationship_name.clear();
        let prompt = build_prompt(&request);
        assert!(prompt.contains("Relationship: users_orders (users -> orders, Type: 1:N)"));
    }

    #[test]
    fn test_table_without_fields() {
        let mut graph = SchemaGraph::new();
        graph.add_table(Table::new("t1", Position::default()).with_name("empty"));
        let request = CodeGenerationRequest::from_graph(DatabaseType::Sql, &graph);
        assert!(build_prompt(&request).contains("SCHEMA DEFINITION:\nTable: empty\n\n\nRELATIONSHIPS:"));
    }
}
