use sea_orm::DatabaseConnection;
use migration::MigratorTrait;

use crate::db::connect_in_memory;



/// Fresh in-memory database with all migrations applied
pub(crate) async fn setup_test_db() -> anyhow::Result<DatabaseConnection> {
    let db = connect_in_memory().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}
