use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::LivroError;
use crate::validation::FieldError;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Mensagem {
    pub mensagem: String,
}

#[derive(Debug, Serialize)]
pub struct Cadastro {
    pub mensagem: String,
    pub quantidade: usize,
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct Erro {
    pub erro: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registro: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub detalhes: Vec<FieldError>,
}

impl Mensagem {
    pub fn new(msg: impl Into<String>) -> Self {
        Mensagem { mensagem: msg.into() }
    }
}

impl Cadastro {
    pub fn new(ids: Vec<i64>) -> Self {
        Cadastro {
            mensagem: format!("{} livro(s) cadastrado(s) com sucesso", ids.len()),
            quantidade: ids.len(),
            ids,
        }
    }
}

pub fn success<T: Serialize>(body: T) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

pub fn created<T: Serialize>(body: T) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    (
        status,
        Json(Erro {
            erro: msg.to_string(),
            registro: None,
            detalhes: vec![],
        }),
    )
        .into_response()
}

impl IntoResponse for LivroError {
    fn into_response(self) -> Response {
        match self {
            LivroError::Validation(err) => {
                tracing::info!("rejected payload: {}", err);
                let erro = match err.registro {
                    Some(i) => format!("Livro na posição {} inválido", i),
                    None => "Dados inválidos".to_string(),
                };
                (
                    StatusCode::BAD_REQUEST,
                    Json(Erro {
                        erro,
                        registro: err.registro,
                        detalhes: err.detalhes,
                    }),
                )
                    .into_response()
            }
            LivroError::NotFound(id) => {
                tracing::info!("livro {} not found", id);
                error_response(StatusCode::NOT_FOUND, "Livro não encontrado")
            }
            LivroError::UnknownId(reason) => {
                tracing::info!("unmatched livro id: {}", reason);
                error_response(StatusCode::NOT_FOUND, "Livro não encontrado")
            }
            LivroError::InvalidInput(msg) => {
                tracing::info!("invalid input: {}", msg);
                error_response(StatusCode::BAD_REQUEST, &msg)
            }
            e @ (LivroError::Storage(_) | LivroError::StorageState(_)) => {
                tracing::error!(error = %crate::unpack_error(&e), "storage failure");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Erro interno no banco de dados")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    #[test]
    fn test_cadastro_message_counts_records() {
        let body = Cadastro::new(vec![4, 5, 6]);
        assert_eq!(body.mensagem, "3 livro(s) cadastrado(s) com sucesso");
        assert_eq!(body.quantidade, 3);
    }

    #[test]
    fn test_error_status_mapping() {
        let validation = LivroError::Validation(ValidationError {
            registro: None,
            detalhes: vec![],
        });
        assert_eq!(validation.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(LivroError::NotFound(1).into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            LivroError::UnknownId("abc".to_string()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            LivroError::InvalidInput("x".to_string()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LivroError::StorageState("x".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_body_shape() {
        let err = Erro {
            erro: "Livro na posição 1 inválido".to_string(),
            registro: Some(1),
            detalhes: vec![FieldError {
                campo: "image_url".to_string(),
                mensagem: "URL inválida".to_string(),
            }],
        };
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["registro"], 1);
        assert_eq!(value["detalhes"][0]["campo"], "image_url");

        let plain = serde_json::to_value(Erro {
            erro: "Livro não encontrado".to_string(),
            registro: None,
            detalhes: vec![],
        })
        .unwrap();
        assert_eq!(plain, serde_json::json!({"erro": "Livro não encontrado"}));
    }
}
