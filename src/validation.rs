//! Field rules for book payloads.
//!
//! Payloads arrive as loose JSON objects. Full mode requires every field in
//! [`CAMPOS`]; partial mode checks only the fields that are present. Unknown
//! keys are ignored in both modes.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use url::{Host, Url};

use crate::error::LivroError;
use crate::model::{CAMPOS, LivroPatch, NovoLivro};

const EXTENSOES_IMAGEM: [&str; 4] = [".jpg", ".jpeg", ".png", ".webp"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub campo: String,
    pub mensagem: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Position of the offending record inside a batch payload.
    pub registro: Option<usize>,
    pub detalhes: Vec<FieldError>,
}

impl ValidationError {
    fn single(campo: &str, mensagem: impl Into<String>) -> Self {
        ValidationError {
            registro: None,
            detalhes: vec![FieldError {
                campo: campo.to_string(),
                mensagem: mensagem.into(),
            }],
        }
    }

    fn at(mut self, registro: usize) -> Self {
        self.registro = Some(registro);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let campos: Vec<String> = self
            .detalhes
            .iter()
            .map(|d| format!("{} ({})", d.campo, d.mensagem))
            .collect();
        match self.registro {
            Some(i) => write!(f, "record {}: {}", i, campos.join(", ")),
            None => write!(f, "{}", campos.join(", ")),
        }
    }
}

impl std::error::Error for ValidationError {}

const ESQUEMAS_URL: [&str; 4] = ["http", "https", "ftp", "ftps"];

/// Domain hosts must be `localhost` or carry a dot-separated top-level label.
fn host_is_public(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.');
            domain.eq_ignore_ascii_case("localhost")
                || domain
                    .rsplit_once('.')
                    .is_some_and(|(name, tld)| !name.is_empty() && !tld.is_empty())
        }
        Some(Host::Ipv4(_) | Host::Ipv6(_)) => true,
        None => false,
    }
}

fn check_image_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|_| "URL inválida".to_string())?;
    if !ESQUEMAS_URL.contains(&url.scheme()) || !host_is_public(&url) {
        return Err("URL inválida".to_string());
    }

    let path = url.path().to_ascii_lowercase();
    if EXTENSOES_IMAGEM.iter().any(|ext| path.ends_with(ext)) {
        Ok(())
    } else {
        Err("image_url deve terminar em .jpg, .jpeg, .png ou .webp".to_string())
    }
}

fn check_field(campo: &str, value: &Value) -> Result<String, String> {
    let Some(text) = value.as_str() else {
        return Err("deve ser um texto".to_string());
    };
    if text.trim().is_empty() {
        return Err("não pode ser vazio".to_string());
    }
    if campo == "image_url" {
        check_image_url(text)?;
    }
    Ok(text.to_string())
}

/// Runs the per-field rules over every recognized key, collecting all failures.
/// Missing keys are reported only when `required` is set.
fn collect(obj: &Map<String, Value>, required: bool) -> Result<[Option<String>; 4], ValidationError> {
    let mut values: [Option<String>; 4] = Default::default();
    let mut detalhes = Vec::new();

    for (slot, campo) in values.iter_mut().zip(CAMPOS) {
        match obj.get(campo) {
            Some(value) => match check_field(campo, value) {
                Ok(text) => *slot = Some(text),
                Err(mensagem) => detalhes.push(FieldError {
                    campo: campo.to_string(),
                    mensagem,
                }),
            },
            None if required => detalhes.push(FieldError {
                campo: campo.to_string(),
                mensagem: "campo obrigatório".to_string(),
            }),
            None => {}
        }
    }

    if detalhes.is_empty() {
        Ok(values)
    } else {
        Err(ValidationError {
            registro: None,
            detalhes,
        })
    }
}

pub fn validate_full(obj: &Map<String, Value>) -> Result<NovoLivro, ValidationError> {
    let [titulo, categoria, autor, image_url] = collect(obj, true)?;
    // collect() guarantees every slot is filled when `required` is set
    match (titulo, categoria, autor, image_url) {
        (Some(titulo), Some(categoria), Some(autor), Some(image_url)) => Ok(NovoLivro {
            titulo,
            categoria,
            autor,
            image_url,
        }),
        _ => Err(ValidationError::single("livro", "campos obrigatórios ausentes")),
    }
}

pub fn validate_partial(obj: &Map<String, Value>) -> Result<LivroPatch, ValidationError> {
    let [titulo, categoria, autor, image_url] = collect(obj, false)?;
    Ok(LivroPatch {
        titulo,
        categoria,
        autor,
        image_url,
    })
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::single("livro", "deve ser um objeto JSON"))
}

/// Validates a create payload: a single object or an array of objects.
/// Every record is checked before any of them reaches storage.
pub fn validate_batch(body: &Value) -> Result<Vec<NovoLivro>, LivroError> {
    let registros: Vec<&Value> = match body {
        Value::Array(items) => items.iter().collect(),
        Value::Null => vec![],
        Value::Object(obj) if obj.is_empty() => vec![],
        other => vec![other],
    };

    if registros.is_empty() {
        return Err(LivroError::InvalidInput("Nenhum dado enviado".to_string()));
    }

    let batch = matches!(body, Value::Array(_));
    registros
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            as_object(value)
                .and_then(validate_full)
                .map_err(|e| if batch { e.at(i) } else { e })
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(LivroError::Validation)
}

/// Validates a patch payload; an object with no recognized field is rejected.
pub fn validate_patch(body: &Value) -> Result<LivroPatch, LivroError> {
    let obj = match body {
        Value::Object(obj) => obj,
        Value::Null => return Err(LivroError::InvalidInput("Nenhum dado enviado para atualização".to_string())),
        _ => return Err(LivroError::Validation(ValidationError::single("livro", "deve ser um objeto JSON"))),
    };

    let patch = validate_partial(obj).map_err(LivroError::Validation)?;
    if patch.is_empty() {
        return Err(LivroError::InvalidInput("Nenhum dado enviado para atualização".to_string()));
    }
    Ok(patch)
}

/// Validates a full-update payload.
pub fn validate_replace(body: &Value) -> Result<NovoLivro, LivroError> {
    if body.is_null() {
        return Err(LivroError::InvalidInput("Nenhum dado enviado".to_string()));
    }
    as_object(body).and_then(validate_full).map_err(LivroError::Validation)
}
