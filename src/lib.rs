use axum::Router;
use axum::http::{HeaderValue, Method, header};
use std::error::Error;
use tower_http::cors::{Any, CorsLayer};

use crate::handler::AppState;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod model;
pub mod repository;
pub mod routes;
pub mod validation;

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}

/// Only `origin` may call the API when set, any origin otherwise.
pub fn cors_layer(origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(match origin {
        Some(origin) => cors.allow_origin(HeaderValue::from_str(origin)?),
        None => cors.allow_origin(Any),
    })
}

pub fn app(state: AppState, cors: CorsLayer) -> Router {
    routes::routes().layer(cors).with_state(state)
}
