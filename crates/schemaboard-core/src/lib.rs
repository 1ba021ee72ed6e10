//! SchemaBoard Core - Schema graph editing engine
//!
//! This crate provides the consistency engine behind the schema canvas:
//! - Table/field/relationship graph with snapshot semantics
//! - Reference resolution and relationship name propagation on rename
//! - Connection rules and the relationship editor workflow
//! - JSON document import/export and quick SQL rendering
//! - An editing session that applies commands to the graph

pub mod connection;
pub mod document;
pub mod editor;
pub mod error;
pub mod graph;
pub mod resolver;
pub mod session;
pub mod sql;

// Re-exports for convenience
pub use graph::{
    parse_field_type, parse_relation_type, random_position, Field, FieldPatch, FieldType,
    ForeignRef, IdSource, NanoIdSource, Position, RelationType, Relationship, SchemaGraph,
    SequentialIds, Table, DEFAULT_EDGE_TYPE, DEFAULT_FIELD_NAME, DEFAULT_TABLE_NAME,
    UNNAMED_RELATION,
};
pub use resolver::{rename_table, Resolver, UNKNOWN_FIELD, UNKNOWN_TABLE};

pub use connection::{
    connect, disconnect, field_id_from_source_handle, field_id_from_target_handle,
    source_handle_for, target_handle_for, Connection,
};
pub use editor::RelationshipEditor;

// Serialization re-exports
pub use document::{
    edge_records, export_document, export_file_name, import_document, table_records,
    DocumentMetadata, EdgeData, EdgeRecord, FieldRecord, ImportedSchema, SchemaDocument,
    TableRecord, DOCUMENT_VERSION,
};
pub use error::ImportError;
pub use sql::generate_legacy_sql;

// Session re-exports
pub use session::{Command, SchemaSession, SessionEvent, DEFAULT_PROJECT_NAME};
