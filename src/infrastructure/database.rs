use crate::entities::{flashcards, users, workspaces};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::info;

pub async fn setup_database(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    info!("📂 Database: {}", redact(database_url));

    let mut opt = ConnectOptions::new(database_url);
    opt.min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    // An in-memory SQLite database lives and dies with its single connection
    if database_url.contains(":memory:") {
        opt.max_connections(1);
    } else {
        opt.max_connections(20)
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800));
    }

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

/// Creates the tables (parents before children, for the foreign keys) and
/// the lookup indexes. Safe to run on every start.
pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Running schema migrations...");

    let stmts = vec![
        (
            "users",
            schema
                .create_table_from_entity(users::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "workspaces",
            schema
                .create_table_from_entity(workspaces::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "flashcards",
            schema
                .create_table_from_entity(flashcards::Entity)
                .if_not_exists()
                .to_owned(),
        ),
    ];

    for (name, stmt) in stmts {
        db.execute(builder.build(&stmt)).await?;
        info!("   - Table '{}' checked/created", name);
    }

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_workspaces_user_id ON workspaces(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_workspaces_created_at ON workspaces(created_at)",
        "CREATE INDEX IF NOT EXISTS idx_flashcards_workspace_id ON flashcards(workspace_id)",
    ];

    for query in indexes {
        db.execute(sea_orm::Statement::from_string(builder, query.to_string()))
            .await?;
    }

    Ok(())
}

/// Hides the password part of a connection URL before it is logged
fn redact(database_url: &str) -> String {
    match (database_url.find("://"), database_url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let credentials = &database_url[scheme_end + 3..at];
            match credentials.split_once(':') {
                Some((user, _)) => format!(
                    "{}{}:***{}",
                    &database_url[..scheme_end + 3],
                    user,
                    &database_url[at..]
                ),
                None => database_url.to_string(),
            }
        }
        _ => database_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        assert_eq!(
            redact("postgres://vault:hunter2@db:5432/vault"),
            "postgres://vault:***@db:5432/vault"
        );
        assert_eq!(redact("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            redact("sqlite://flashcard_vault.db?mode=rwc"),
            "sqlite://flashcard_vault.db?mode=rwc"
        );
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = setup_database("sqlite::memory:").await.unwrap();
        run_migrations(&db).await.unwrap();
    }
}
