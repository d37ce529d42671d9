#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web server for popbuilder.
//!
//! Serves the intro and map landing pages behind a cookie gate, the
//! population results page, the CSV download, and static files under
//! `/resources`. Population data comes from two pre-built, read-only
//! `SQLite` stores opened once at startup.

pub mod config;
mod handlers;
pub mod templates;

use std::path::Path;

use actix_files::Files;
use actix_web::dev::fn_service;
use actix_web::{App, HttpServer, middleware, web};
use popbuilder_database::DbError;
use popbuilder_database::db::PopulationStores;

pub use config::ServerConfig;
pub use templates::{Pages, RenderError};

/// Largest accepted form body. Each selected zone costs about 12 bytes
/// once its separator is percent-encoded.
pub const FORM_LIMIT: usize = 4 * 1024 * 1024;

/// Shared application state.
pub struct AppState {
    /// Read-only population stores.
    pub stores: PopulationStores,
    /// Pages and templates loaded at startup.
    pub pages: Pages,
}

/// Errors that stop the server from starting or running.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A population store could not be opened.
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    /// A page or template file could not be read.
    #[error("Failed to load template {path}: {source}")]
    Template {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A template failed to parse or validate.
    #[error("Template error: {0}")]
    Render(#[from] RenderError),

    /// Binding or running the HTTP server failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Registers every route. Unknown paths, and files missing under
/// `/resources`, get the not-found page.
pub fn routes(cfg: &mut web::ServiceConfig, resources_dir: &Path) {
    cfg.app_data(web::FormConfig::default().limit(FORM_LIMIT))
        .service(web::resource("/").to(handlers::home))
        .service(web::resource("/results").to(handlers::results))
        .service(web::resource("/download").to(handlers::download))
        .service(
            Files::new("/resources", resources_dir)
                .default_handler(fn_service(handlers::not_found_service)),
        )
        .default_service(web::to(handlers::not_found));
}

/// Starts the popbuilder server.
///
/// Opens both population stores, loads the page templates, and runs the
/// Actix-Web HTTP server until it is stopped. The stores are closed once
/// the server returns. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if a store or template cannot be loaded, or the
/// server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    log::info!("Opening population stores in {}...", config.db_dir.display());
    let stores = PopulationStores::open(&config.db_dir).await?;

    log::info!("Loading templates from {}...", config.template_dir.display());
    let pages = Pages::load(&config.template_dir)?;

    let state = web::Data::new(AppState {
        stores: stores.clone(),
        pages,
    });

    let resources_dir = config.resources_dir.clone();

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(|cfg| routes(cfg, &resources_dir))
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await?;

    stores.close();

    Ok(())
}
