use libsql::Connection;

use crate::error::{LivroError, Result};
use crate::model::{Livro, LivroPatch, NovoLivro};

const SELECT_LIVRO: &str = "SELECT id, titulo, categoria, autor, image_url FROM LIVROS";

/// Book queries bound to one open connection.
pub struct Livros<'a> {
    conn: &'a Connection,
}

/// Wraps `q` for a substring `LIKE`, escaping the wildcard characters so the
/// keyword is matched literally.
fn like_pattern(q: &str) -> String {
    let mut pattern = String::with_capacity(q.len() + 2);
    pattern.push('%');
    for c in q.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl<'a> Livros<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn begin(&self) -> Result<()> {
        self.conn.execute("BEGIN IMMEDIATE", ()).await?;
        Ok(())
    }

    async fn finish<T>(&self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.conn.execute("COMMIT", ()).await?;
                Ok(value)
            }
            Err(e) => {
                let _ = self.conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    /// Inserts every record in one transaction and returns the assigned ids in
    /// input order. Nothing is kept if any insert fails.
    pub async fn insert(&self, livros: &[NovoLivro]) -> Result<Vec<i64>> {
        self.begin().await?;
        let result = self.insert_internal(livros).await;
        self.finish(result).await
    }

    async fn insert_internal(&self, livros: &[NovoLivro]) -> Result<Vec<i64>> {
        let query = r#"
            INSERT INTO LIVROS (titulo, categoria, autor, image_url)
            VALUES (?, ?, ?, ?)
            RETURNING id
        "#;

        let mut ids = Vec::with_capacity(livros.len());
        for livro in livros {
            let mut rows = self
                .conn
                .query(
                    query,
                    libsql::params![
                        livro.titulo.as_str(),
                        livro.categoria.as_str(),
                        livro.autor.as_str(),
                        livro.image_url.as_str()
                    ],
                )
                .await?;

            match rows.next().await? {
                Some(row) => ids.push(row.get::<i64>(0)?),
                None => return Err(LivroError::StorageState("insert returned no id".to_string())),
            }
        }

        Ok(ids)
    }

    pub async fn list(&self) -> Result<Vec<Livro>> {
        let query = format!("{SELECT_LIVRO} ORDER BY id");
        let mut rows = self.conn.query(&query, ()).await?;
        let mut livros = Vec::new();

        while let Some(row) = rows.next().await? {
            livros.push(self.row_to_livro(&row)?);
        }

        Ok(livros)
    }

    pub async fn get(&self, id: i64) -> Result<Livro> {
        let query = format!("{SELECT_LIVRO} WHERE id = ?");
        let mut rows = self.conn.query(&query, libsql::params![id]).await?;

        match rows.next().await? {
            Some(row) => self.row_to_livro(&row),
            None => Err(LivroError::NotFound(id)),
        }
    }

    /// Records whose titulo, categoria or autor contain `q`. ASCII letters match
    /// case-insensitively.
    pub async fn search(&self, q: &str) -> Result<Vec<Livro>> {
        if q.is_empty() {
            return Err(LivroError::InvalidInput(
                "É necessário fornecer uma palavra-chave para a busca".to_string(),
            ));
        }

        let query = format!(
            r#"{SELECT_LIVRO}
            WHERE titulo LIKE ? ESCAPE '\' OR categoria LIKE ? ESCAPE '\' OR autor LIKE ? ESCAPE '\'
            ORDER BY id"#
        );

        let pattern = like_pattern(q);
        let mut rows = self
            .conn
            .query(&query, libsql::params![pattern.clone(), pattern.clone(), pattern])
            .await?;
        let mut livros = Vec::new();

        while let Some(row) = rows.next().await? {
            livros.push(self.row_to_livro(&row)?);
        }

        Ok(livros)
    }

    /// Overwrites every field of record `id` inside a write transaction.
    pub async fn replace(&self, id: i64, livro: &NovoLivro) -> Result<()> {
        self.begin().await?;
        let result = self.replace_internal(id, livro).await;
        self.finish(result).await
    }

    async fn replace_internal(&self, id: i64, livro: &NovoLivro) -> Result<()> {
        let query = r#"
            UPDATE LIVROS
            SET titulo = ?, categoria = ?, autor = ?, image_url = ?
            WHERE id = ?
        "#;

        let changed = self
            .conn
            .execute(
                query,
                libsql::params![
                    livro.titulo.as_str(),
                    livro.categoria.as_str(),
                    livro.autor.as_str(),
                    livro.image_url.as_str(),
                    id
                ],
            )
            .await?;

        if changed == 0 {
            return Err(LivroError::NotFound(id));
        }
        Ok(())
    }

    /// Read-merge-write under one write transaction. Returns the stored record.
    pub async fn patch(&self, id: i64, patch: LivroPatch) -> Result<Livro> {
        if patch.is_empty() {
            return Err(LivroError::InvalidInput("Nenhum dado enviado para atualização".to_string()));
        }

        self.begin().await?;
        let result = self.patch_internal(id, patch).await;
        self.finish(result).await
    }

    async fn patch_internal(&self, id: i64, patch: LivroPatch) -> Result<Livro> {
        let merged = patch.apply(self.get(id).await?);
        let novo = NovoLivro {
            titulo: merged.titulo.clone(),
            categoria: merged.categoria.clone(),
            autor: merged.autor.clone(),
            image_url: merged.image_url.clone(),
        };
        self.replace_internal(id, &novo).await?;
        Ok(merged)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM LIVROS WHERE id = ?", libsql::params![id])
            .await?;

        if changed == 0 {
            return Err(LivroError::NotFound(id));
        }
        Ok(())
    }

    fn row_to_livro(&self, row: &libsql::Row) -> Result<Livro> {
        Ok(Livro {
            id: row.get(0)?,
            titulo: row.get(1)?,
            categoria: row.get(2)?,
            autor: row.get(3)?,
            image_url: row.get(4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn novo(titulo: &str, categoria: &str, autor: &str) -> NovoLivro {
        NovoLivro {
            titulo: titulo.to_string(),
            categoria: categoria.to_string(),
            autor: autor.to_string(),
            image_url: "https://x.com/capa.jpg".to_string(),
        }
    }

    async fn setup() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("livros.db")).await.unwrap();
        (dir, db)
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Dune"), "%Dune%");
        assert_eq!(like_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let (_dir, db) = setup().await;
        let conn = db.connect().await.unwrap();
        let livros = Livros::new(&conn);

        let ids = livros
            .insert(&[novo("Dune", "Ficção", "Frank Herbert"), novo("Emma", "Romance", "Jane Austen")])
            .await
            .unwrap();
        assert_eq!(ids, vec![1, 2]);

        let livro = livros.get(2).await.unwrap();
        assert_eq!(
            livro,
            Livro {
                id: 2,
                titulo: "Emma".to_string(),
                categoria: "Romance".to_string(),
                autor: "Jane Austen".to_string(),
                image_url: "https://x.com/capa.jpg".to_string(),
            }
        );
        assert_eq!(livros.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let (_dir, db) = setup().await;
        let conn = db.connect().await.unwrap();
        let livros = Livros::new(&conn);

        livros.insert(&[novo("Dune", "Ficção", "Frank Herbert")]).await.unwrap();
        livros.delete(1).await.unwrap();
        let ids = livros.insert(&[novo("Emma", "Romance", "Jane Austen")]).await.unwrap();

        assert_eq!(ids, vec![2]);
        assert!(matches!(livros.get(1).await, Err(LivroError::NotFound(1))));
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_found() {
        let (_dir, db) = setup().await;
        let conn = db.connect().await.unwrap();
        let livros = Livros::new(&conn);

        assert!(matches!(livros.get(9).await, Err(LivroError::NotFound(9))));
        assert!(matches!(livros.delete(9).await, Err(LivroError::NotFound(9))));
        assert!(matches!(
            livros.replace(9, &novo("Dune", "Ficção", "Frank Herbert")).await,
            Err(LivroError::NotFound(9))
        ));
        let patch = LivroPatch {
            titulo: Some("Duna".to_string()),
            ..Default::default()
        };
        assert!(matches!(livros.patch(9, patch).await, Err(LivroError::NotFound(9))));
    }

    #[tokio::test]
    async fn test_failed_replace_rolls_back() {
        let (_dir, db) = setup().await;
        let conn = db.connect().await.unwrap();
        let livros = Livros::new(&conn);

        assert!(matches!(
            livros.replace(3, &novo("Dune", "Ficção", "Frank Herbert")).await,
            Err(LivroError::NotFound(3))
        ));
        assert!(conn.is_autocommit());

        // A dangling transaction would make this BEGIN fail.
        let ids = livros.insert(&[novo("Emma", "Romance", "Jane Austen")]).await.unwrap();
        assert_eq!(ids, vec![1]);

        livros.replace(1, &novo("Emma", "Clássico", "Jane Austen")).await.unwrap();
        assert!(conn.is_autocommit());
        assert_eq!(livros.get(1).await.unwrap().categoria, "Clássico");
    }

    #[tokio::test]
    async fn test_patch_changes_only_supplied_fields() {
        let (_dir, db) = setup().await;
        let conn = db.connect().await.unwrap();
        let livros = Livros::new(&conn);
        livros.insert(&[novo("Dune", "Ficção", "Frank Herbert")]).await.unwrap();
        let before = livros.get(1).await.unwrap();

        let patch = LivroPatch {
            categoria: Some("Ficção científica".to_string()),
            ..Default::default()
        };
        let returned = livros.patch(1, patch).await.unwrap();
        let after = livros.get(1).await.unwrap();

        assert_eq!(returned, after);
        assert_eq!(
            after,
            Livro {
                categoria: "Ficção científica".to_string(),
                ..before
            }
        );
    }

    #[tokio::test]
    async fn test_empty_patch_is_invalid_input() {
        let (_dir, db) = setup().await;
        let conn = db.connect().await.unwrap();
        let livros = Livros::new(&conn);

        assert!(matches!(
            livros.patch(1, LivroPatch::default()).await,
            Err(LivroError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_search_matches_any_text_column() {
        let (_dir, db) = setup().await;
        let conn = db.connect().await.unwrap();
        let livros = Livros::new(&conn);
        livros
            .insert(&[
                novo("Dune", "Ficção", "Frank Herbert"),
                novo("Emma", "Romance", "Jane Austen"),
                novo("100% Rust", "Tecnologia", "Ferris"),
            ])
            .await
            .unwrap();

        let titles = |found: Vec<Livro>| found.into_iter().map(|l| l.titulo).collect::<Vec<_>>();

        assert_eq!(titles(livros.search("dune").await.unwrap()), vec!["Dune"]);
        assert_eq!(titles(livros.search("roman").await.unwrap()), vec!["Emma"]);
        assert_eq!(titles(livros.search("Herb").await.unwrap()), vec!["Dune"]);
        assert_eq!(titles(livros.search("%").await.unwrap()), vec!["100% Rust"]);
        assert!(livros.search("Tolkien").await.unwrap().is_empty());
    }
}
