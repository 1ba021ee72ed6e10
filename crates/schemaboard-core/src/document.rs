//! Schema document (JSON file format)
//!
//! The exported document is the persisted form of a schema:
//!
//! ```json
//! {
//!   "schema":  [ { "id", "position", "tableName", "fields": [...], "primaryKeys" } ],
//!   "edges":   [ { "id", "type", "source", "sourceHandle", "target", "targetHandle",
//!                  "data": { "relationship", "relationshipName" } } ],
//!   "version": "1.1.0",
//!   "metadata": { "exportedAt", "projectName" }
//! }
//! ```
//!
//! Export always writes every member (absent values become `null` or
//! `false`). Import accepts any document with array-valued `schema` and
//! `edges` and fills everything else with defaults.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ImportError;
use crate::graph::{
    parse_field_type, parse_relation_type, random_position, Field, FieldType, ForeignRef,
    IdSource, Position, RelationType, Relationship, SchemaGraph, Table, DEFAULT_EDGE_TYPE,
    DEFAULT_FIELD_NAME, DEFAULT_TABLE_NAME, UNNAMED_RELATION,
};

/// Format version written into every exported document
pub const DOCUMENT_VERSION: &str = "1.1.0";

// ============================================================================
// Document Records
// ============================================================================

/// Exported form of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub length: Option<u32>,
    pub is_primary: bool,
    pub is_required: bool,
    pub is_unique: bool,
    pub is_foreign: bool,
    pub foreign_ref: Option<ForeignRef>,
    pub relation_type: Option<RelationType>,
}

/// Exported form of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRecord {
    pub id: String,
    pub position: Position,
    pub table_name: String,
    pub fields: Vec<FieldRecord>,
    pub primary_keys: Vec<String>,
}

/// Relationship payload of an exported edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    pub relationship: RelationType,
    pub relationship_name: String,
}

/// Exported form of a relationship edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub source: String,
    pub source_handle: Option<String>,
    pub target: String,
    pub target_handle: Option<String>,
    pub data: EdgeData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// ISO-8601, UTC, millisecond precision
    pub exported_at: String,
    pub project_name: String,
}

/// A complete exported schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub schema: Vec<TableRecord>,
    pub edges: Vec<EdgeRecord>,
    pub version: String,
    pub metadata: DocumentMetadata,
}

impl SchemaDocument {
    /// Render as two-space indented JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl From<&Field> for FieldRecord {
    fn from(field: &Field) -> Self {
        Self {
            id: field.id.clone(),
            name: field.name.clone(),
            field_type: field.field_type,
            length: field.length.filter(|l| *l > 0),
            is_primary: field.is_primary,
            is_required: field.is_required,
            is_unique: field.is_unique,
            is_foreign: field.is_foreign,
            foreign_ref: field.foreign_ref.clone(),
            relation_type: field.relation_type,
        }
    }
}

impl From<&Table> for TableRecord {
    fn from(table: &Table) -> Self {
        Self {
            id: table.id.clone(),
            position: table.position,
            table_name: table.name.clone(),
            fields: table.fields.iter().map(FieldRecord::from).collect(),
            primary_keys: table.primary_keys.clone(),
        }
    }
}

impl From<&Relationship> for EdgeRecord {
    fn from(edge: &Relationship) -> Self {
        let edge_type = if edge.edge_type.is_empty() {
            DEFAULT_EDGE_TYPE.to_string()
        } else {
            edge.edge_type.clone()
        };
        Self {
            id: edge.id.clone(),
            edge_type,
            source: edge.source.clone(),
            source_handle: edge.source_handle.clone(),
            target: edge.target.clone(),
            target_handle: edge.target_handle.clone(),
            data: EdgeData {
                relationship: edge.relationship,
                relationship_name: edge.display_name().to_string(),
            },
        }
    }
}

// ============================================================================
// Export
// ============================================================================

/// Table records in graph order
pub fn table_records(graph: &SchemaGraph) -> Vec<TableRecord> {
    graph.tables().map(TableRecord::from).collect()
}

/// Edge records in graph order
pub fn edge_records(graph: &SchemaGraph) -> Vec<EdgeRecord> {
    graph.relationships().map(EdgeRecord::from).collect()
}

/// Project the graph into a document stamped with `exported_at`.
pub fn export_document(
    graph: &SchemaGraph,
    project_name: &str,
    exported_at: DateTime<Utc>,
) -> SchemaDocument {
    let document = SchemaDocument {
        schema: table_records(graph),
        edges: edge_records(graph),
        version: DOCUMENT_VERSION.to_string(),
        metadata: DocumentMetadata {
            exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            project_name: project_name.to_string(),
        },
    };
    debug!(
        "Exported {} table(s) and {} edge(s) for '{}'",
        document.schema.len(),
        document.edges.len(),
        project_name
    );
    document
}

/// Download file name for a project: every non-alphanumeric character
/// becomes `_`, then `_schema.json` is appended.
pub fn export_file_name(project_name: &str) -> String {
    let stem: String = project_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_schema.json", stem)
}

// ============================================================================
// Import
// ============================================================================

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedSchema {
    pub graph: SchemaGraph,
    /// `metadata.projectName`, when present and non-empty
    pub project_name: Option<String>,
}

// Lenient mirrors of the records. Every member may be missing.

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawTable {
    id: Option<String>,
    position: Option<Position>,
    table_name: Option<String>,
    fields: Option<Vec<Value>>,
    primary_keys: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawField {
    id: Option<String>,
    name: Option<String>,
    #[serde(rename = "type")]
    field_type: Option<String>,
    length: Option<Value>,
    is_primary: Option<bool>,
    is_required: Option<bool>,
    is_unique: Option<bool>,
    is_foreign: Option<bool>,
    foreign_ref: Option<Value>,
    relation_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawForeignRef {
    node_id: Option<String>,
    field_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawEdge {
    id: Option<String>,
    #[serde(rename = "type")]
    edge_type: Option<String>,
    source: Option<String>,
    source_handle: Option<String>,
    target: Option<String>,
    target_handle: Option<String>,
    data: Option<RawEdgeData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawEdgeData {
    relationship: Option<String>,
    relationship_name: Option<String>,
}

/// Parse a schema document into a fresh graph.
///
/// Fails when the text is not JSON, when `schema` or `edges` is missing or not
/// an array, when an entry is not an object of the expected shape, or when an
/// edge has no endpoints. Everything else falls back to defaults: missing
/// positions are drawn from `rng`, missing ids from `ids`, unknown type labels
/// become the default type, and unusable lengths are dropped.
pub fn import_document<R, I>(
    text: &str,
    rng: &mut R,
    ids: &mut I,
) -> Result<ImportedSchema, ImportError>
where
    R: Rng + ?Sized,
    I: IdSource + ?Sized,
{
    let root: Value = serde_json::from_str(text)?;

    let schema = root
        .get("schema")
        .and_then(Value::as_array)
        .ok_or_else(|| ImportError::invalid_shape("schema"))?;
    let edges = root
        .get("edges")
        .and_then(Value::as_array)
        .ok_or_else(|| ImportError::invalid_shape("edges"))?;

    let tables = schema
        .iter()
        .enumerate()
        .map(|(i, value)| import_table(value, &format!("schema[{}]", i), rng, ids))
        .collect::<Result<Vec<_>, _>>()?;

    let relationships = edges
        .iter()
        .enumerate()
        .map(|(i, value)| import_edge(value, &format!("edges[{}]", i), ids))
        .collect::<Result<Vec<_>, _>>()?;

    let project_name = root
        .pointer("/metadata/projectName")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    info!(
        "Imported {} table(s) and {} edge(s)",
        tables.len(),
        relationships.len()
    );

    Ok(ImportedSchema {
        graph: SchemaGraph::from_parts(tables, relationships),
        project_name,
    })
}

fn decode<T: DeserializeOwned>(value: &Value, location: &str) -> Result<T, ImportError> {
    serde_json::from_value(value.clone())
        .map_err(|e| ImportError::invalid_record(location, e.to_string()))
}

/// Treat empty strings like missing values
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn import_table<R, I>(
    value: &Value,
    location: &str,
    rng: &mut R,
    ids: &mut I,
) -> Result<Table, ImportError>
where
    R: Rng + ?Sized,
    I: IdSource + ?Sized,
{
    let raw: RawTable = decode(value, location)?;

    let id = non_empty(raw.id).unwrap_or_else(|| ids.next_id());
    let position = raw.position.unwrap_or_else(|| random_position(rng));

    let mut table = Table::new(id, position);
    table.name = raw.table_name.unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string());
    table.primary_keys = raw.primary_keys.unwrap_or_default();

    for (j, field_value) in raw.fields.unwrap_or_default().iter().enumerate() {
        let field_location = format!("{}.fields[{}]", location, j);
        table.fields.push(import_field(field_value, &field_location, ids)?);
    }

    Ok(table)
}

fn import_field<I>(value: &Value, location: &str, ids: &mut I) -> Result<Field, ImportError>
where
    I: IdSource + ?Sized,
{
    let raw: RawField = decode(value, location)?;

    let field_type = match non_empty(raw.field_type) {
        None => FieldType::default(),
        Some(name) => parse_field_type(&name).unwrap_or_else(|| {
            warn!(
                "{}: unknown field type '{}', using {}",
                location,
                name,
                FieldType::default().as_str()
            );
            FieldType::default()
        }),
    };
    let relation_type = non_empty(raw.relation_type).and_then(|label| {
        let parsed = parse_relation_type(&label);
        if parsed.is_none() {
            warn!("{}: dropping unknown relation type '{}'", location, label);
        }
        parsed
    });

    let mut field = Field::new(non_empty(raw.id).unwrap_or_else(|| ids.next_id()))
        .with_name(raw.name.unwrap_or_else(|| DEFAULT_FIELD_NAME.to_string()))
        .with_type(field_type)
        .with_length(positive_length(raw.length.as_ref()));
    field.is_primary = raw.is_primary.unwrap_or(false);
    field.is_required = raw.is_required.unwrap_or(false);
    field.is_unique = raw.is_unique.unwrap_or(false);
    field.is_foreign = raw.is_foreign.unwrap_or(false);
    field.foreign_ref = raw.foreign_ref.as_ref().and_then(lenient_foreign_ref);
    field.relation_type = relation_type;

    Ok(field)
}

/// Lengths written by hand or by older exports may be negative, fractional or
/// strings. Only a positive integer is kept.
fn positive_length(value: Option<&Value>) -> Option<u32> {
    let length = match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    u32::try_from(length).ok().filter(|n| *n > 0)
}

/// A reference missing one side is kept as a dangling reference; one missing
/// both sides (or not an object) is dropped.
fn lenient_foreign_ref(value: &Value) -> Option<ForeignRef> {
    let raw: RawForeignRef = serde_json::from_value(value.clone()).ok()?;
    match (raw.node_id, raw.field_id) {
        (None, None) => None,
        (node_id, field_id) => Some(ForeignRef::new(
            node_id.unwrap_or_default(),
            field_id.unwrap_or_default(),
        )),
    }
}

fn import_edge<I>(value: &Value, location: &str, ids: &mut I) -> Result<Relationship, ImportError>
where
    I: IdSource + ?Sized,
{
    let raw: RawEdge = decode(value, location)?;

    let source = non_empty(raw.source)
        .ok_or_else(|| ImportError::invalid_record(location, "missing source"))?;
    let target = non_empty(raw.target)
        .ok_or_else(|| ImportError::invalid_record(location, "missing target"))?;

    let data = raw.data.unwrap_or_default();
    let relationship = match non_empty(data.relationship) {
        None => RelationType::default(),
        Some(label) => parse_relation_type(&label).unwrap_or_else(|| {
            warn!(
                "{}: unknown relationship '{}', using {}",
                location,
                label,
                RelationType::default().as_str()
            );
            RelationType::default()
        }),
    };
    let name = non_empty(data.relationship_name).unwrap_or_else(|| UNNAMED_RELATION.to_string());

    let mut edge = Relationship::new(non_empty(raw.id).unwrap_or_else(|| ids.next_id()), source, target)
        .with_handles(raw.source_handle, raw.target_handle)
        .with_relationship(relationship)
        .with_name(name);
    if let Some(edge_type) = non_empty(raw.edge_type) {
        edge.edge_type = edge_type;
    }

    Ok(edge)
}
