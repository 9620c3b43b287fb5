use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;

use crate::error::LivroError;

const SCHEMA: (&str, &str) = ("001_livros.sql", include_str!("migrations/001_livros.sql"));

// How long a connection waits on another writer's lock before giving up.
const BUSY_TIMEOUT_PRAGMA: &str = "PRAGMA busy_timeout = 5000";

/// Handle to the file-backed store. Connections are opened per operation via
/// [`Database::connect`] and released when dropped.
pub struct Database {
    db: LibsqlDatabase,
}

impl Database {
    pub async fn new(path: &Path) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        let database = Database { db };

        let conn = database.connect().await?;
        conn.query("SELECT 1", ()).await?;
        Self::init_schema(&conn).await?;

        Ok(database)
    }

    async fn init_schema(conn: &Connection) -> Result<()> {
        let (name, sql) = SCHEMA;
        tracing::info!("ensuring schema: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute schema {name}: {e}"))?;
        Ok(())
    }

    pub async fn connect(&self) -> std::result::Result<Connection, LivroError> {
        let conn = self.db.connect()?;
        let mut rows = conn.query(BUSY_TIMEOUT_PRAGMA, ()).await?;
        rows.next().await?;
        drop(rows);
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("livros.db");

        let first = Database::new(&path).await.unwrap();
        let conn = first.connect().await.unwrap();
        conn.execute(
            "INSERT INTO LIVROS (titulo, categoria, autor, image_url) VALUES (?, ?, ?, ?)",
            libsql::params!["Dune", "Ficção", "Frank Herbert", "https://x.com/a.jpg"],
        )
        .await
        .unwrap();
        drop(conn);
        drop(first);

        let second = Database::new(&path).await.unwrap();
        let conn = second.connect().await.unwrap();
        let mut rows = conn.query("SELECT COUNT(*) FROM LIVROS", ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
    }
}
