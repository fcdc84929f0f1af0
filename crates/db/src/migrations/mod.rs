//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20260101_000001_create_idea_table;
mod m20260101_000002_create_vote_table;
mod m20260101_000003_create_set_votes_function;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_idea_table::Migration),
            Box::new(m20260101_000002_create_vote_table::Migration),
            Box::new(m20260101_000003_create_set_votes_function::Migration),
        ]
    }
}
