use serde::{Deserialize, Serialize};

/// Recognized book fields, in column order.
pub const CAMPOS: [&str; 4] = ["titulo", "categoria", "autor", "image_url"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Livro {
    pub id: i64,
    pub titulo: String,
    pub categoria: String,
    pub autor: String,
    pub image_url: String,
}

/// A fully validated record, ready to be inserted or to replace an existing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NovoLivro {
    pub titulo: String,
    pub categoria: String,
    pub autor: String,
    pub image_url: String,
}

/// A validated subset of fields for a partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivroPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl LivroPatch {
    pub fn is_empty(&self) -> bool {
        self.titulo.is_none() && self.categoria.is_none() && self.autor.is_none() && self.image_url.is_none()
    }

    /// Merges the supplied fields over `livro`, leaving the others untouched.
    pub fn apply(self, livro: Livro) -> Livro {
        Livro {
            id: livro.id,
            titulo: self.titulo.unwrap_or(livro.titulo),
            categoria: self.categoria.unwrap_or(livro.categoria),
            autor: self.autor.unwrap_or(livro.autor),
            image_url: self.image_url.unwrap_or(livro.image_url),
        }
    }
}
