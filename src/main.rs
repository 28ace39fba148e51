// src/main.rs
use actix_web::{App, HttpServer, middleware, web};
use log::info;
use std::sync::Arc;

mod config;
mod eras;
mod errors;
mod handlers;
mod loading;
mod models;
mod services;

#[cfg(test)]
mod test_support;

use crate::config::Config;
use crate::services::{GeminiService, Session};

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting Time Machine...");

    let config = Config::from_env()?;
    let gemini = Arc::new(GeminiService::new(&config)?);
    if config.request_timeout.is_none() {
        info!("No request timeout configured; transformations may wait indefinitely");
    }

    let app_state = AppState {
        session: Arc::new(Session::new(gemini)),
    };

    info!("Using model {} at {}", config.model, config.api_base_url);
    info!("Starting HTTP server on {}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .configure(handlers::routes)
    })
    .bind(&config.bind_addr)?
    .run()
    .await?;

    Ok(())
}
