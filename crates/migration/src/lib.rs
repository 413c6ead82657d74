pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_users_table;
mod m20250601_000002_create_refresh_tokens_table;
mod m20250601_000003_create_otp_challenges_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_users_table::Migration),
            Box::new(m20250601_000002_create_refresh_tokens_table::Migration),
            Box::new(m20250601_000003_create_otp_challenges_table::Migration),
        ]
    }
}

/// Database connection helper for CLI usage
pub async fn connect_to_database(
    database_url: &str,
) -> Result<sea_orm::DatabaseConnection, sea_orm::DbErr> {
    sea_orm::Database::connect(database_url).await
}
