use actix_web::middleware::NormalizePath;
use actix_web::web::{self, Data};
use actix_web::{App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;

#[cfg(test)]
#[macro_use]
mod test_support;

mod api;
mod auth;
mod backend;
mod config;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod utils;

use auth::session::SessionStore;
use backend::{BackendClient, HrApi};
use config::Config;
use routes::Limiters;
use utils::payslip_poll::PollRegistry;

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env().context("reading configuration")?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "portal.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(backend = %config.backend_base_url, "Portal starting...");

    let client = BackendClient::new(&config).context("building backend client")?;
    let api: Arc<dyn HrApi> = Arc::new(client);
    let sessions = SessionStore::new(&config);
    let polls = Data::new(PollRegistry::new());
    let limiters = Limiters::from_config(&config)?;

    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::from(api.clone()))
            .app_data(Data::new(sessions.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(polls.clone())
            .app_data(web::PayloadConfig::new(config.max_upload_bytes))
            .configure(|cfg| routes::configure(cfg, &config, &limiters))
    })
    .bind(&server_addr)
    .with_context(|| format!("binding {server_addr}"))?
    .run()
    .await?;

    info!("Portal stopped");
    Ok(())
}
