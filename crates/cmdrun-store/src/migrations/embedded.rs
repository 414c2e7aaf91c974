//! Embedded SQL migrations

pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// All embedded migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_initial_schema",
        sql: include_str!("../../migrations/001_initial_schema.sql"),
    }]
}
