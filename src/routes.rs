use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::handler::{self, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::index))
        .route("/livros", get(handler::list_livros))
        .route("/livros", post(handler::create_livros))
        .route("/livros/", get(handler::list_livros))
        .route("/livros/", post(handler::create_livros))
        .route("/livros/buscar", get(handler::search_livros))
        .route("/livros/:id", get(handler::get_livro))
        .route("/livros/:id", put(handler::replace_livro))
        .route("/livros/:id", patch(handler::patch_livro))
        .route("/livros/:id", delete(handler::delete_livro))
}
