//! Editing session
//!
//! A `SchemaSession` owns the current graph snapshot and the project name and
//! applies `Command`s to it one at a time. Each applied command produces a new
//! snapshot; readers holding an earlier `Arc<SchemaGraph>` keep a stable view.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::connection::{self, Connection};
use crate::document::{import_document, ImportedSchema};
use crate::editor::RelationshipEditor;
use crate::error::ImportError;
use crate::graph::{
    random_position, Field, FieldPatch, IdSource, NanoIdSource, Position, RelationType,
    SchemaGraph, Table,
};
use crate::resolver;

/// Project name used until one is set or imported
pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";

/// A single editing gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Add an empty table. Defaults: "New Table" at a random position.
    AddTable {
        name: Option<String>,
        position: Option<Position>,
    },
    MoveTable {
        table_id: String,
        position: Position,
    },
    /// Rename a table and rewrite the names of its relationships
    RenameTable { table_id: String, name: String },
    /// Remove a table; its relationships stay behind, dangling
    DeleteTable { table_id: String },
    /// Append a field built from the defaults with `patch` applied
    AddField { table_id: String, patch: FieldPatch },
    UpdateField {
        table_id: String,
        field_id: String,
        patch: FieldPatch,
    },
    RemoveField { table_id: String, field_id: String },
    Connect(Connection),
    Disconnect { edge_id: String },
    /// Commit a relationship edit (see `RelationshipEditor::save`)
    SaveRelationship {
        edge_id: String,
        relationship: RelationType,
        name: String,
    },
    /// Drop relationships whose endpoint table no longer exists
    PruneDangling,
    RenameProject { name: String },
    /// Swap in an imported graph, and its project name if it has one
    Import(ImportedSchema),
}

/// What an applied command changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    TableAdded { table_id: String },
    TableMoved { table_id: String },
    TableRenamed {
        table_id: String,
        name: String,
        relationships_renamed: usize,
    },
    TableDeleted {
        table_id: String,
        dangling_relationships: usize,
    },
    FieldAdded { table_id: String, field_id: String },
    FieldUpdated { table_id: String, field_id: String },
    FieldRemoved { table_id: String, field_id: String },
    Connected { edge_id: String },
    Disconnected { edge_id: String },
    RelationshipSaved { edge_id: String },
    RelationshipsPruned { edge_ids: Vec<String> },
    ProjectRenamed { name: String },
    Imported { tables: usize, relationships: usize },
}

/// Owner of the current schema snapshot.
pub struct SchemaSession<R = StdRng, I = NanoIdSource> {
    graph: Arc<SchemaGraph>,
    project_name: String,
    rng: R,
    ids: I,
}

impl SchemaSession<StdRng, NanoIdSource> {
    /// Empty session with entropy-seeded positions and random ids
    pub fn new() -> Self {
        Self::with_sources(StdRng::from_entropy(), NanoIdSource)
    }
}

impl Default for SchemaSession<StdRng, NanoIdSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng, I: IdSource> SchemaSession<R, I> {
    /// Empty session drawing positions from `rng` and ids from `ids`
    pub fn with_sources(rng: R, ids: I) -> Self {
        Self {
            graph: Arc::new(SchemaGraph::new()),
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            rng,
            ids,
        }
    }

    /// Start from an existing graph
    pub fn with_graph(mut self, graph: SchemaGraph, project_name: &str) -> Self {
        self.graph = Arc::new(graph);
        self.project_name = project_or_default(project_name);
        self
    }

    /// The current snapshot. Later commands never change it.
    pub fn snapshot(&self) -> Arc<SchemaGraph> {
        Arc::clone(&self.graph)
    }

    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Parse a document and, on success, apply it as an `Import` command.
    ///
    /// On error the session is left as it was.
    pub fn import_text(&mut self, text: &str) -> Result<Vec<SessionEvent>, ImportError> {
        let imported = import_document(text, &mut self.rng, &mut self.ids)?;
        Ok(self.apply(Command::Import(imported)))
    }

    /// Apply one command.
    ///
    /// Returns the resulting events. A command that does not apply (unknown
    /// table, field or edge, incomplete connection, empty patch) returns no
    /// events and leaves the snapshot untouched.
    pub fn apply(&mut self, command: Command) -> Vec<SessionEvent> {
        debug!("Applying {:?}", command);

        let command = match command {
            Command::RenameProject { name } => {
                self.project_name = project_or_default(&name);
                info!("Project renamed to '{}'", self.project_name);
                return vec![SessionEvent::ProjectRenamed {
                    name: self.project_name.clone(),
                }];
            }
            Command::Import(imported) => return self.apply_import(imported),
            other => other,
        };

        let mut next = (*self.graph).clone();
        let events = self.apply_to(&mut next, command);
        self.commit(next, events)
    }

    /// Run one relationship editor session against the current graph: open
    /// the editor on `edge_id`, let `edit` change the draft, then save it.
    ///
    /// Returns `RelationshipSaved`, or no events when the edge does not exist.
    pub fn edit_relationship<F>(&mut self, edge_id: &str, edit: F) -> Vec<SessionEvent>
    where
        F: FnOnce(&mut RelationshipEditor),
    {
        let mut next = (*self.graph).clone();
        let Some(mut editor) = RelationshipEditor::open(&next, edge_id) else {
            debug!("No relationship '{}' to edit", edge_id);
            return vec![];
        };
        edit(&mut editor);

        let events = if editor.save(&mut next) {
            vec![SessionEvent::RelationshipSaved {
                edge_id: edge_id.to_string(),
            }]
        } else {
            vec![]
        };
        self.commit(next, events)
    }

    /// Swap `next` in when the change produced events.
    fn commit(&mut self, next: SchemaGraph, events: Vec<SessionEvent>) -> Vec<SessionEvent> {
        if events.is_empty() {
            debug!("Command had no effect");
        } else {
            self.graph = Arc::new(next);
            for event in &events {
                info!("{:?}", event);
            }
        }
        events
    }

    fn apply_import(&mut self, imported: ImportedSchema) -> Vec<SessionEvent> {
        let ImportedSchema {
            graph,
            project_name,
        } = imported;
        let tables = graph.table_count();
        let relationships = graph.relationship_count();

        self.graph = Arc::new(graph);
        let mut events = vec![SessionEvent::Imported {
            tables,
            relationships,
        }];
        if let Some(name) = project_name {
            self.project_name = project_or_default(&name);
            events.push(SessionEvent::ProjectRenamed {
                name: self.project_name.clone(),
            });
        }

        info!(
            "Imported {} table(s), {} relationship(s) into '{}'",
            tables, relationships, self.project_name
        );
        events
    }

    fn apply_to(&mut self, graph: &mut SchemaGraph, command: Command) -> Vec<SessionEvent> {
        match command {
            Command::AddTable { name, position } => {
                let table_id = self.ids.next_id();
                let position = position.unwrap_or_else(|| random_position(&mut self.rng));
                let mut table = Table::new(table_id.clone(), position);
                if let Some(name) = name {
                    table.name = name;
                }
                graph.add_table(table);
                vec![SessionEvent::TableAdded { table_id }]
            }

            Command::MoveTable { table_id, position } => {
                if graph.update_table(&table_id, |t| t.with_position(position)) {
                    vec![SessionEvent::TableMoved { table_id }]
                } else {
                    vec![]
                }
            }

            Command::RenameTable { table_id, name } => {
                match resolver::rename_table(graph, &table_id, &name) {
                    Some(relationships_renamed) => vec![SessionEvent::TableRenamed {
                        table_id,
                        name,
                        relationships_renamed,
                    }],
                    None => vec![],
                }
            }

            Command::DeleteTable { table_id } => {
                if graph.remove_table(&table_id).is_none() {
                    return vec![];
                }
                let dangling_relationships = graph.relationships_touching(&table_id).count();
                vec![SessionEvent::TableDeleted {
                    table_id,
                    dangling_relationships,
                }]
            }

            Command::AddField { table_id, patch } => {
                if !graph.contains_table(&table_id) {
                    return vec![];
                }
                let field = Field::new(self.ids.next_id()).patched(&patch);
                let field_id = field.id.clone();
                graph.update_table(&table_id, |t| t.with_field(field));
                vec![SessionEvent::FieldAdded { table_id, field_id }]
            }

            Command::UpdateField {
                table_id,
                field_id,
                patch,
            } => {
                let exists = graph
                    .table(&table_id)
                    .is_some_and(|t| t.field(&field_id).is_some());
                if !exists || patch.is_empty() {
                    return vec![];
                }
                graph.update_table(&table_id, |t| t.with_field_updated(&field_id, &patch));
                vec![SessionEvent::FieldUpdated { table_id, field_id }]
            }

            Command::RemoveField { table_id, field_id } => {
                let exists = graph
                    .table(&table_id)
                    .is_some_and(|t| t.field(&field_id).is_some());
                if !exists {
                    return vec![];
                }
                graph.update_table(&table_id, |t| t.without_field(&field_id));
                vec![SessionEvent::FieldRemoved { table_id, field_id }]
            }

            Command::Connect(conn) => match connection::connect(graph, &conn, &mut self.ids) {
                Some(edge_id) => vec![SessionEvent::Connected { edge_id }],
                None => vec![],
            },

            Command::Disconnect { edge_id } => {
                if connection::disconnect(graph, &edge_id) {
                    vec![SessionEvent::Disconnected { edge_id }]
                } else {
                    vec![]
                }
            }

            Command::SaveRelationship {
                edge_id,
                relationship,
                name,
            } => {
                let Some(mut editor) = RelationshipEditor::open(graph, &edge_id) else {
                    return vec![];
                };
                editor.set_relationship(relationship);
                editor.set_name(name);
                if editor.save(graph) {
                    vec![SessionEvent::RelationshipSaved { edge_id }]
                } else {
                    vec![]
                }
            }

            Command::PruneDangling => {
                let edge_ids = graph.prune_dangling_relationships();
                if edge_ids.is_empty() {
                    vec![]
                } else {
                    vec![SessionEvent::RelationshipsPruned { edge_ids }]
                }
            }

            // Handled in `apply`
            Command::RenameProject { .. } | Command::Import(_) => vec![],
        }
    }
}

fn project_or_default(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        DEFAULT_PROJECT_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
