//! Code generator trait and request/response types
//!
//! A generator turns an exported schema (table and edge records) into
//! dialect-specific DDL. Implementations:
//! - `GeminiGenerator` - Google Generative Language API

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use schemaboard_core::{edge_records, table_records, EdgeRecord, SchemaGraph, TableRecord};
use serde::{Deserialize, Serialize};

/// Target database dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    #[default]
    Sql,
    Mysql,
    Postgresql,
    Mongodb,
    Sqlite,
    Mariadb,
    Oracle,
    Mssql,
}

impl DatabaseType {
    pub const ALL: [DatabaseType; 8] = [
        DatabaseType::Sql,
        DatabaseType::Mysql,
        DatabaseType::Postgresql,
        DatabaseType::Mongodb,
        DatabaseType::Sqlite,
        DatabaseType::Mariadb,
        DatabaseType::Oracle,
        DatabaseType::Mssql,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::Sql => "sql",
            DatabaseType::Mysql => "mysql",
            DatabaseType::Postgresql => "postgresql",
            DatabaseType::Mongodb => "mongodb",
            DatabaseType::Sqlite => "sqlite",
            DatabaseType::Mariadb => "mariadb",
            DatabaseType::Oracle => "oracle",
            DatabaseType::Mssql => "mssql",
        }
    }

    /// Dialect instructions placed at the top of every prompt
    pub fn system_prompt(&self) -> &'static str {
        match self {
            DatabaseType::Sql => "You are an expert SQL database designer. Generate ONLY clean, well-structured SQL CREATE TABLE statements with proper constraints, indexes, and foreign key relationships. Use standard SQL syntax that works across multiple database systems. DO NOT include explanations, comments, or any text other than the SQL code.",
            DatabaseType::Mysql => "You are an expert MySQL database designer. Generate ONLY MySQL-specific CREATE TABLE statements with proper data types, constraints, indexes, and foreign key relationships. Use MySQL-specific features like AUTO_INCREMENT, ENGINE=InnoDB, and proper charset settings. DO NOT include explanations, comments, or any text other than the SQL code.",
            DatabaseType::Postgresql => "You are an expert PostgreSQL database designer. Generate ONLY PostgreSQL-specific CREATE TABLE statements with proper data types, constraints, indexes, and foreign key relationships. Use PostgreSQL-specific features like SERIAL, UUID types, and proper schema design. DO NOT include explanations, comments, or any text other than the SQL code.",
            DatabaseType::Mongodb => "You are an expert MongoDB database designer. Generate ONLY MongoDB schema design including collection structures, document schemas with proper validation rules, and indexes. Provide ONLY JavaScript code for creating collections and validation schemas. DO NOT include explanations, comments, or any text other than the JavaScript code.",
            DatabaseType::Sqlite => "You are an expert SQLite database designer. Generate ONLY SQLite-compatible CREATE TABLE statements with proper data types, constraints, and indexes. Keep in mind SQLite's type affinity system and limitations. DO NOT include explanations, comments, or any text other than the SQL code.",
            DatabaseType::Mariadb => "You are an expert MariaDB database designer. Generate ONLY MariaDB-specific CREATE TABLE statements with proper data types, constraints, indexes, and foreign key relationships. Use MariaDB-specific features and optimizations. DO NOT include explanations, comments, or any text other than the SQL code.",
            DatabaseType::Oracle => "You are an expert Oracle database designer. Generate ONLY Oracle-specific CREATE TABLE statements with proper data types, constraints, indexes, and foreign key relationships. Use Oracle-specific features like SEQUENCES, TABLESPACES, and proper naming conventions. DO NOT include explanations, comments, or any text other than the SQL code.",
            DatabaseType::Mssql => "You are an expert Microsoft SQL Server database designer. Generate ONLY T-SQL CREATE TABLE statements with proper data types, constraints, indexes, and foreign key relationships. Use SQL Server-specific features and best practices. DO NOT include explanations, comments, or any text other than the T-SQL code.",
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        DatabaseType::ALL
            .into_iter()
            .find(|db| db.as_str() == lower)
            .ok_or_else(|| {
                let known: Vec<&str> = DatabaseType::ALL.iter().map(|db| db.as_str()).collect();
                format!(
                    "unknown database type '{}', expected one of: {}",
                    s,
                    known.join(", ")
                )
            })
    }
}

/// Input to a code generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeGenerationRequest {
    pub database_type: DatabaseType,
    pub schema: Vec<TableRecord>,
    pub edges: Vec<EdgeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

impl CodeGenerationRequest {
    pub fn new(database_type: DatabaseType, schema: Vec<TableRecord>, edges: Vec<EdgeRecord>) -> Self {
        Self {
            database_type,
            schema,
            edges,
            custom_prompt: None,
        }
    }

    /// Build a request from a graph snapshot, using the exported record form.
    pub fn from_graph(database_type: DatabaseType, graph: &SchemaGraph) -> Self {
        Self::new(database_type, table_records(graph), edge_records(graph))
    }

    /// Extra requirements appended to the prompt. Blank text is dropped.
    pub fn with_custom_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.custom_prompt = if prompt.trim().is_empty() {
            None
        } else {
            Some(prompt)
        };
        self
    }
}

/// Outcome of a generation call. Failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeGenerationResponse {
    pub success: bool,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CodeGenerationResponse {
    pub fn ok(code: impl Into<String>) -> Self {
        Self {
            success: true,
            code: code.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            code: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Backend that produces dialect code for a schema.
///
/// Implementations must be thread-safe (`Send + Sync`) so one generator can
/// serve several callers. `generate` never fails: transport and provider
/// problems come back as `success: false` with a message.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Generate code for the request
    async fn generate(&self, request: &CodeGenerationRequest) -> CodeGenerationResponse;

    /// Whether credentials are available
    fn is_configured(&self) -> bool;

    /// Short provider identifier for logs and CLI output
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemaboard_core::{Field, Position, Relationship, Table};

    #[test]
    fn test_database_type_parse() {
        assert_eq!("postgresql".parse::<DatabaseType>(), Ok(DatabaseType::Postgresql));
        assert_eq!(" MSSQL ".parse::<DatabaseType>(), Ok(DatabaseType::Mssql));
        assert!("postgres".parse::<DatabaseType>().is_err());
        assert_eq!(DatabaseType::default(), DatabaseType::Sql);
    }

    #[test]
    fn test_database_type_serde_lowercase() {
        let json = serde_json::to_string(&DatabaseType::Mariadb).unwrap();
        assert_eq!(json, "\"mariadb\"");
        let parsed: DatabaseType = serde_json::from_str("\"oracle\"").unwrap();
        assert_eq!(parsed, DatabaseType::Oracle);
    }

    #[test]
    fn test_system_prompts_close_with_code_only_instruction() {
        for db in DatabaseType::ALL {
            let prompt = db.system_prompt();
            assert!(prompt.starts_with("You are an expert"), "{}", db);
            assert!(prompt.contains("DO NOT include explanations"), "{}", db);
        }
        assert!(DatabaseType::Mongodb
            .system_prompt()
            .ends_with("the JavaScript code."));
        assert!(DatabaseType::Mssql.system_prompt().ends_with("the T-SQL code."));
    }

    #[test]
    fn test_request_from_graph() {
        let mut graph = SchemaGraph::new();
        graph.add_table(
            Table::new("t1", Position::default())
                .with_name("users")
                .with_field(Field::new("f1").with_name("id")),
        );
        graph.add_table(Table::new("t2", Position::default()).with_name("orders"));
        graph.add_relationship(Relationship::new("e1", "t1", "t2"));

        let request = CodeGenerationRequest::from_graph(DatabaseType::Sqlite, &graph)
            .with_custom_prompt("   ");

        assert_eq!(request.schema.len(), 2);
        assert_eq!(request.schema[0].table_name, "users");
        assert_eq!(request.edges.len(), 1);
        assert_eq!(request.custom_prompt, None);
    }

    #[test]
    fn test_response_constructors() {
        let ok = CodeGenerationResponse::ok("CREATE TABLE a (id INT);");
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed = CodeGenerationResponse::failure("boom");
        assert!(!failed.success);
        assert!(failed.code.is_empty());
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }
}
