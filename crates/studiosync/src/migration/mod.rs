//! Database migrations for the studiosync schema.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_schema;

/// Migrator holding all schema migrations in order.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260301_000001_create_schema::Migration)]
    }
}
