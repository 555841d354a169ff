use crate::entities::file_records;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::env;
use std::time::Duration;
use tracing::info;

pub async fn setup_database() -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://secret-drop.db?mode=rwc".into());

    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Running auto-migrations...");

    let stmt = schema
        .create_table_from_entity(file_records::Entity)
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&stmt)).await?;
    info!("   - Table 'file_records' checked/created");

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_file_records_created_at ON file_records(created_at)",
        "CREATE INDEX IF NOT EXISTS idx_file_records_title ON file_records(title)",
    ];

    for query in indexes {
        match db
            .execute(sea_orm::Statement::from_string(builder, query.to_owned()))
            .await
        {
            Ok(_) => info!("   - Executed schema update: {}", query),
            Err(e) => tracing::warn!("   - Schema update warning: {} -> {}", query, e),
        }
    }

    Ok(())
}
