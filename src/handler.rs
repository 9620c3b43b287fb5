use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    response::{Html, Response},
};
use serde_json::Value;

use crate::api::{Cadastro, Mensagem, SearchParams, created, success};
use crate::db::Database;
use crate::error::{LivroError, Result};
use crate::repository::Livros;
use crate::validation;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

fn payload(body: std::result::Result<Json<Value>, JsonRejection>) -> Result<Value> {
    body.map(|Json(value)| value)
        .map_err(|rejection| LivroError::InvalidInput(format!("JSON inválido: {}", rejection.body_text())))
}

fn livro_id(id: std::result::Result<Path<i64>, PathRejection>) -> Result<i64> {
    id.map(|Path(id)| id).map_err(|rejection| LivroError::UnknownId(rejection.body_text()))
}

pub async fn index() -> Html<&'static str> {
    Html("<h2>Bem-vindo à API de Doações de Livros!</h2>")
}

pub async fn create_livros(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    let novos = validation::validate_batch(&payload(body)?)?;

    let conn = state.db.connect().await?;
    let ids = Livros::new(&conn).insert(&novos).await?;

    tracing::info!(count = ids.len(), "created livros");
    Ok(created(Cadastro::new(ids)))
}

pub async fn list_livros(State(state): State<AppState>) -> Result<Response> {
    let conn = state.db.connect().await?;
    let livros = Livros::new(&conn).list().await?;

    tracing::info!(count = livros.len(), "listed livros");
    Ok(success(livros))
}

pub async fn get_livro(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Response> {
    let id = livro_id(id)?;
    let conn = state.db.connect().await?;
    let livro = Livros::new(&conn).get(id).await?;

    Ok(success(livro))
}

pub async fn search_livros(
    State(state): State<AppState>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response> {
    let q = params
        .ok()
        .and_then(|Query(params)| params.q)
        .unwrap_or_default();

    if q.is_empty() {
        return Err(LivroError::InvalidInput(
            "É necessário fornecer uma palavra-chave para a busca".to_string(),
        ));
    }

    let conn = state.db.connect().await?;
    let livros = Livros::new(&conn).search(&q).await?;

    tracing::info!(q = %q, count = livros.len(), "searched livros");
    if livros.is_empty() {
        return Ok(success(Mensagem::new("Nenhum livro encontrado")));
    }
    Ok(success(livros))
}

pub async fn replace_livro(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    let id = livro_id(id)?;
    let novo = validation::validate_replace(&payload(body)?)?;

    let conn = state.db.connect().await?;
    Livros::new(&conn).replace(id, &novo).await?;

    tracing::info!(id, "replaced livro");
    Ok(success(Mensagem::new("Livro atualizado com sucesso")))
}

pub async fn patch_livro(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    let id = livro_id(id)?;
    let patch = validation::validate_patch(&payload(body)?)?;

    let conn = state.db.connect().await?;
    Livros::new(&conn).patch(id, patch).await?;

    tracing::info!(id, "patched livro");
    Ok(success(Mensagem::new("Livro atualizado com sucesso")))
}

pub async fn delete_livro(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Response> {
    let id = livro_id(id)?;

    let conn = state.db.connect().await?;
    Livros::new(&conn).delete(id).await?;

    tracing::info!(id, "deleted livro");
    Ok(success(Mensagem::new("Livro deletado com sucesso")))
}
