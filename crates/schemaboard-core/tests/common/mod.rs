//! Common test utilities for integration tests.
//!
//! Builds a small shop schema through the session, the same way the CLI
//! drives it.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use schemaboard_core::{
    Command, Connection, FieldPatch, FieldType, Position, RelationType, SchemaSession,
    SequentialIds, SessionEvent,
};

pub type TestSession = SchemaSession<StdRng, SequentialIds>;

/// Ids of the shop fixture
pub struct Shop {
    pub users: String,
    pub orders: String,
    pub user_id: String,
    pub user_email: String,
    pub order_id: String,
    pub order_user: String,
    pub edge: String,
}

pub fn new_session(seed: u64) -> TestSession {
    SchemaSession::with_sources(StdRng::seed_from_u64(seed), SequentialIds::new("id"))
}

/// Add a table at the session's default (random) canvas position
pub fn add_table(session: &mut TestSession, name: &str) -> String {
    add_table_at(session, name, None)
}

pub fn add_table_at(session: &mut TestSession, name: &str, position: Option<Position>) -> String {
    match session
        .apply(Command::AddTable {
            name: Some(name.to_string()),
            position,
        })
        .as_slice()
    {
        [SessionEvent::TableAdded { table_id }] => table_id.clone(),
        other => panic!("unexpected events: {:?}", other),
    }
}

pub fn add_field(session: &mut TestSession, table_id: &str, patch: FieldPatch) -> String {
    match session
        .apply(Command::AddField {
            table_id: table_id.to_string(),
            patch,
        })
        .as_slice()
    {
        [SessionEvent::FieldAdded { field_id, .. }] => field_id.clone(),
        other => panic!("unexpected events: {:?}", other),
    }
}

pub fn named(name: &str) -> FieldPatch {
    FieldPatch {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

/// users(id PK, email VARCHAR(255) UNIQUE) <- orders(id PK, user_id FK), edge saved as 1:N
pub fn shop(session: &mut TestSession) -> Shop {
    session.apply(Command::RenameProject {
        name: "Shop".into(),
    });

    let users = add_table(session, "users");
    let user_id = add_field(
        session,
        &users,
        FieldPatch {
            is_primary: Some(true),
            is_required: Some(true),
            ..named("id")
        },
    );
    let user_email = add_field(
        session,
        &users,
        FieldPatch {
            field_type: Some(FieldType::Varchar),
            length: Some(Some(255)),
            is_unique: Some(true),
            ..named("email")
        },
    );

    let orders = add_table(session, "orders");
    let order_id = add_field(
        session,
        &orders,
        FieldPatch {
            is_primary: Some(true),
            ..named("id")
        },
    );
    let order_user = add_field(session, &orders, named("user_id"));

    let events = session.apply(Command::Connect(Connection::between_fields(
        users.clone(),
        &user_id,
        orders.clone(),
        &order_user,
    )));
    let edge = match events.as_slice() {
        [SessionEvent::Connected { edge_id }] => edge_id.clone(),
        other => panic!("unexpected events: {:?}", other),
    };
    session.apply(Command::SaveRelationship {
        edge_id: edge.clone(),
        relationship: RelationType::OneToMany,
        name: "users_orders".into(),
    });

    Shop {
        users,
        orders,
        user_id,
        user_email,
        order_id,
        order_user,
        edge,
    }
}
