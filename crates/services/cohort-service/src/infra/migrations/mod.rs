//! Database migrations.
//!
//! Each migration is a separate module following SeaORM conventions.
//! Migration names follow the pattern: m{YYYYMMDD}_{NNNNNN}_{description}

use sea_orm_migration::prelude::*;

mod m20240901_000001_create_classes;
mod m20240901_000002_create_rosters;
mod m20240901_000003_create_surveys;
mod m20240901_000004_create_engagement;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240901_000001_create_classes::Migration),
            Box::new(m20240901_000002_create_rosters::Migration),
            Box::new(m20240901_000003_create_surveys::Migration),
            Box::new(m20240901_000004_create_engagement::Migration),
        ]
    }
}
