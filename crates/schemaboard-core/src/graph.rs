//! Schema Graph Definitions
//!
//! This module defines the table/field/relationship model edited on the canvas
//! and the `SchemaGraph` store that holds it.
//!
//! The store is arena-style: tables and relationships live in insertion-ordered
//! maps keyed by their stable ids, and every value is held behind an `Arc`.
//! Updates never mutate a shared value; they build a new `Table` or
//! `Relationship` and swap it into the index, so a cloned `SchemaGraph` is an
//! independent snapshot.

use std::sync::Arc;

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Display name given to freshly created tables
pub const DEFAULT_TABLE_NAME: &str = "New Table";

/// Name given to freshly appended fields
pub const DEFAULT_FIELD_NAME: &str = "column_name";

/// Diagram edge kind used for relationship edges
pub const DEFAULT_EDGE_TYPE: &str = "custom-edge";

/// Relationship name used when none was ever set
pub const UNNAMED_RELATION: &str = "unnamed_relation";

// ============================================================================
// Field Types
// ============================================================================

/// Column data types offered by the table editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    #[default]
    Integer,
    String,
    Text,
    Boolean,
    Date,
    Datetime,
    Float,
    Decimal,
    Json,
    Uuid,
    Enum,
    /// Variable-length string; the only type that carries a `length`
    Varchar,
}

impl FieldType {
    /// Every type, in the order the editor lists them
    pub const ALL: [FieldType; 12] = [
        FieldType::Integer,
        FieldType::String,
        FieldType::Text,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Datetime,
        FieldType::Float,
        FieldType::Decimal,
        FieldType::Json,
        FieldType::Uuid,
        FieldType::Enum,
        FieldType::Varchar,
    ];

    /// Get the SQL-style upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "INTEGER",
            FieldType::String => "STRING",
            FieldType::Text => "TEXT",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Date => "DATE",
            FieldType::Datetime => "DATETIME",
            FieldType::Float => "FLOAT",
            FieldType::Decimal => "DECIMAL",
            FieldType::Json => "JSON",
            FieldType::Uuid => "UUID",
            FieldType::Enum => "ENUM",
            FieldType::Varchar => "VARCHAR",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a type name, ignoring case.
pub fn parse_field_type(name: &str) -> Option<FieldType> {
    let upper = name.trim().to_ascii_uppercase();
    FieldType::ALL.into_iter().find(|t| t.as_str() == upper)
}

// ============================================================================
// Relationship Cardinality
// ============================================================================

/// Cardinality of a relationship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RelationType {
    #[default]
    #[serde(rename = "1:1")]
    OneToOne,
    #[serde(rename = "1:N")]
    OneToMany,
    #[serde(rename = "N:N")]
    ManyToMany,
}

impl RelationType {
    pub const ALL: [RelationType; 3] = [
        RelationType::OneToOne,
        RelationType::OneToMany,
        RelationType::ManyToMany,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::OneToOne => "1:1",
            RelationType::OneToMany => "1:N",
            RelationType::ManyToMany => "N:N",
        }
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a cardinality label (`1:1`, `1:N`, `N:N`, case-insensitive).
pub fn parse_relation_type(label: &str) -> Option<RelationType> {
    match label.trim().to_ascii_uppercase().as_str() {
        "1:1" => Some(RelationType::OneToOne),
        "1:N" => Some(RelationType::OneToMany),
        "N:N" => Some(RelationType::ManyToMany),
        _ => None,
    }
}

// ============================================================================
// Position
// ============================================================================

/// Canvas coordinates of a table. Cosmetic only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pick a default on-canvas position for a new or imported table.
///
/// x is drawn from `[100, 400)` and y from `[100, 300)`.
pub fn random_position<R: Rng + ?Sized>(rng: &mut R) -> Position {
    Position {
        x: rng.gen_range(100.0..400.0),
        y: rng.gen_range(100.0..300.0),
    }
}

// ============================================================================
// Identifiers
// ============================================================================

/// Source of fresh ids for tables, fields and relationships.
pub trait IdSource {
    fn next_id(&mut self) -> String;
}

/// Random url-safe ids (21 characters), used outside of tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NanoIdSource;

impl IdSource for NanoIdSource {
    fn next_id(&mut self) -> String {
        nanoid::nanoid!()
    }
}

/// Deterministic `<prefix>-<n>` ids.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

// ============================================================================
// Field
// ============================================================================

/// Pointer from a foreign-key field to the field it references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignRef {
    /// Referenced table id
    pub node_id: String,
    /// Referenced field id within that table
    pub field_id: String,
}

impl ForeignRef {
    pub fn new(node_id: impl Into<String>, field_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            field_id: field_id.into(),
        }
    }
}

/// A column of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Unique within the owning table
    pub id: String,
    pub name: String,
    pub field_type: FieldType,
    /// Only ever `Some` when `field_type` is `Varchar`
    pub length: Option<u32>,
    pub is_required: bool,
    pub is_unique: bool,
    pub is_primary: bool,
    pub is_foreign: bool,
    pub foreign_ref: Option<ForeignRef>,
    pub relation_type: Option<RelationType>,
}

impl Field {
    /// Create a field with the editor defaults (`column_name`, INTEGER, no flags)
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: DEFAULT_FIELD_NAME.to_string(),
            field_type: FieldType::default(),
            length: None,
            is_required: false,
            is_unique: false,
            is_primary: false,
            is_foreign: false,
            foreign_ref: None,
            relation_type: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the type, clearing the length unless the new type is VARCHAR.
    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        if field_type != FieldType::Varchar {
            self.length = None;
        }
        self
    }

    /// Set the VARCHAR length. Ignored for other types; zero means "no length".
    pub fn with_length(mut self, length: Option<u32>) -> Self {
        self.length = if self.field_type == FieldType::Varchar {
            length.filter(|l| *l > 0)
        } else {
            None
        };
        self
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Build a new field with `patch` applied on top of this one.
    pub fn patched(&self, patch: &FieldPatch) -> Field {
        let mut next = self.clone();

        if let Some(ref name) = patch.name {
            next.name = name.clone();
        }
        if let Some(field_type) = patch.field_type {
            next = next.with_type(field_type);
        }
        if let Some(length) = patch.length {
            next = next.with_length(length);
        }
        if let Some(v) = patch.is_required {
            next.is_required = v;
        }
        if let Some(v) = patch.is_unique {
            next.is_unique = v;
        }
        if let Some(v) = patch.is_primary {
            next.is_primary = v;
        }
        if let Some(v) = patch.is_foreign {
            next.is_foreign = v;
        }
        if let Some(ref foreign_ref) = patch.foreign_ref {
            next.foreign_ref = foreign_ref.clone();
        }
        if let Some(relation_type) = patch.relation_type {
            next.relation_type = relation_type;
        }

        next
    }
}

/// Partial update of a field. `None` leaves the attribute untouched.
///
/// Nested options (`length`, `foreign_ref`, `relation_type`) distinguish
/// "leave as is" (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub name: Option<String>,
    pub field_type: Option<FieldType>,
    pub length: Option<Option<u32>>,
    pub is_required: Option<bool>,
    pub is_unique: Option<bool>,
    pub is_primary: Option<bool>,
    pub is_foreign: Option<bool>,
    pub foreign_ref: Option<Option<ForeignRef>>,
    pub relation_type: Option<Option<RelationType>>,
}

impl FieldPatch {
    pub fn is_empty(&self) -> bool {
        *self == FieldPatch::default()
    }
}

// ============================================================================
// Table
// ============================================================================

/// A table node on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub id: String,
    /// Display name, freely editable and not required to be unique
    pub name: String,
    pub position: Position,
    pub fields: Vec<Field>,
    /// Carried for export compatibility; `Field::is_primary` is authoritative
    pub primary_keys: Vec<String>,
}

impl Table {
    /// Create an empty table named "New Table"
    pub fn new(id: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            name: DEFAULT_TABLE_NAME.to_string(),
            position,
            fields: Vec::new(),
            primary_keys: Vec::new(),
        }
    }

    /// Get a field by id
    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    pub fn with_name(&self, name: impl Into<String>) -> Table {
        Table {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn with_position(&self, position: Position) -> Table {
        Table {
            position,
            ..self.clone()
        }
    }

    /// Append a field
    pub fn with_field(&self, field: Field) -> Table {
        let mut next = self.clone();
        next.fields.push(field);
        next
    }

    /// Apply `patch` to the field with `field_id`; other fields are carried over as is.
    pub fn with_field_updated(&self, field_id: &str, patch: &FieldPatch) -> Table {
        Table {
            fields: self
                .fields
                .iter()
                .map(|f| {
                    if f.id == field_id {
                        f.patched(patch)
                    } else {
                        f.clone()
                    }
                })
                .collect(),
            ..self.clone()
        }
    }

    /// Drop the field with `field_id`, including any primary key entry for it
    pub fn without_field(&self, field_id: &str) -> Table {
        Table {
            fields: self
                .fields
                .iter()
                .filter(|f| f.id != field_id)
                .cloned()
                .collect(),
            primary_keys: self
                .primary_keys
                .iter()
                .filter(|k| k.as_str() != field_id)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }
}

// ============================================================================
// Relationship
// ============================================================================

/// A relationship edge between a field of one table and a field of another.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: String,
    /// Diagram edge kind, normally `custom-edge`
    pub edge_type: String,
    pub source: String,
    /// Source field id with an `-out` suffix
    pub source_handle: Option<String>,
    pub target: String,
    /// Target field id with an `-in` suffix
    pub target_handle: Option<String>,
    pub relationship: RelationType,
    pub relationship_name: Option<String>,
}

impl Relationship {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            edge_type: DEFAULT_EDGE_TYPE.to_string(),
            source: source.into(),
            source_handle: None,
            target: target.into(),
            target_handle: None,
            relationship: RelationType::default(),
            relationship_name: None,
        }
    }

    pub fn with_handles(mut self, source_handle: Option<String>, target_handle: Option<String>) -> Self {
        self.source_handle = source_handle;
        self.target_handle = target_handle;
        self
    }

    pub fn with_relationship(mut self, relationship: RelationType) -> Self {
        self.relationship = relationship;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.relationship_name = Some(name.into());
        self
    }

    /// Whether either endpoint is the given table
    pub fn touches(&self, table_id: &str) -> bool {
        self.source == table_id || self.target == table_id
    }

    /// Name as exported: the stored name or `unnamed_relation`
    pub fn display_name(&self) -> &str {
        self.relationship_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(UNNAMED_RELATION)
    }
}

// ============================================================================
// Schema Graph Store
// ============================================================================

/// In-memory store of tables and relationships.
///
/// Tables and relationships keep their insertion order, which is also the
/// export order. Values are immutable once stored; see the module docs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaGraph {
    tables: IndexMap<String, Arc<Table>>,
    relationships: IndexMap<String, Arc<Relationship>>,
}

impl SchemaGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from complete collections.
    ///
    /// A repeated id keeps its first position and the last value.
    pub fn from_parts(
        tables: impl IntoIterator<Item = Table>,
        relationships: impl IntoIterator<Item = Relationship>,
    ) -> Self {
        let mut graph = Self::new();
        graph.replace_all(tables, relationships);
        graph
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.relationships.is_empty()
    }

    // ------------------------------------------------------------------------
    // Table Operations
    // ------------------------------------------------------------------------

    /// Add a table. A table with the same id is replaced and returned.
    pub fn add_table(&mut self, table: Table) -> Option<Arc<Table>> {
        self.tables.insert(table.id.clone(), Arc::new(table))
    }

    /// Get a table by id
    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.get(id).map(|t| t.as_ref())
    }

    pub fn contains_table(&self, id: &str) -> bool {
        self.tables.contains_key(id)
    }

    /// Replace a table with the value built by `f` from the current one.
    ///
    /// Returns `false` when no table has this id. The builder must keep the id.
    pub fn update_table<F>(&mut self, id: &str, f: F) -> bool
    where
        F: FnOnce(&Table) -> Table,
    {
        let Some(slot) = self.tables.get_mut(id) else {
            return false;
        };
        let next = f(slot.as_ref());
        debug_assert_eq!(next.id, id, "table update must keep the id");
        *slot = Arc::new(next);
        true
    }

    /// Remove a table. Relationships touching it are left in place (dangling).
    pub fn remove_table(&mut self, id: &str) -> Option<Arc<Table>> {
        let removed = self.tables.shift_remove(id);
        if removed.is_some() {
            let dangling = self.relationships_touching(id).count();
            if dangling > 0 {
                debug!("Table {} removed, {} relationship(s) now dangling", id, dangling);
            }
        }
        removed
    }

    /// Iterate over all tables in order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values().map(|t| t.as_ref())
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    // ------------------------------------------------------------------------
    // Relationship Operations
    // ------------------------------------------------------------------------

    /// Add a relationship. One with the same id is replaced and returned.
    pub fn add_relationship(&mut self, relationship: Relationship) -> Option<Arc<Relationship>> {
        self.relationships
            .insert(relationship.id.clone(), Arc::new(relationship))
    }

    /// Get a relationship by id
    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.get(id).map(|r| r.as_ref())
    }

    /// Replace a relationship with the value built by `f` from the current one.
    pub fn update_relationship<F>(&mut self, id: &str, f: F) -> bool
    where
        F: FnOnce(&Relationship) -> Relationship,
    {
        let Some(slot) = self.relationships.get_mut(id) else {
            return false;
        };
        let next = f(slot.as_ref());
        debug_assert_eq!(next.id, id, "relationship update must keep the id");
        *slot = Arc::new(next);
        true
    }

    pub fn remove_relationship(&mut self, id: &str) -> Option<Arc<Relationship>> {
        self.relationships.shift_remove(id)
    }

    /// Iterate over all relationships in order
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values().map(|r| r.as_ref())
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Relationships with the given table at either end
    pub fn relationships_touching<'a>(
        &'a self,
        table_id: &'a str,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships().filter(move |r| r.touches(table_id))
    }

    // ------------------------------------------------------------------------
    // Bulk Operations
    // ------------------------------------------------------------------------

    /// Swap in new tables and relationships together.
    pub fn replace_all(
        &mut self,
        tables: impl IntoIterator<Item = Table>,
        relationships: impl IntoIterator<Item = Relationship>,
    ) {
        let mut next_tables = IndexMap::new();
        for table in tables {
            if next_tables.contains_key(&table.id) {
                warn!("Duplicate table id '{}', keeping the last one", table.id);
            }
            next_tables.insert(table.id.clone(), Arc::new(table));
        }

        let mut next_relationships = IndexMap::new();
        for relationship in relationships {
            if next_relationships.contains_key(&relationship.id) {
                warn!(
                    "Duplicate relationship id '{}', keeping the last one",
                    relationship.id
                );
            }
            next_relationships.insert(relationship.id.clone(), Arc::new(relationship));
        }

        self.tables = next_tables;
        self.relationships = next_relationships;
    }

    /// Remove relationships whose source or target table no longer exists.
    ///
    /// Returns the ids of the removed relationships.
    pub fn prune_dangling_relationships(&mut self) -> Vec<String> {
        let tables = &self.tables;
        let mut removed = Vec::new();
        self.relationships.retain(|id, r| {
            let keep = tables.contains_key(&r.source) && tables.contains_key(&r.target);
            if !keep {
                removed.push(id.clone());
            }
            keep
        });
        removed
    }
}
