mod adapters;
mod config;
mod error;
mod job_controller;
mod pipeline;
mod services;

use crate::adapters::pdf_export::fonts_available;
use crate::config::ServerConfig;
use crate::job_controller::state::JobsState;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{info, warn};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = ServerConfig::load().map_err(|e| std::io::Error::other(e.to_string()))?;
    if !fonts_available(&config.font_dir) {
        warn!(
            "No TTF fonts found in {}; report export will fail until fonts are installed",
            config.font_dir.display()
        );
    }
    let host = config.host.clone();
    let port = config.port;

    // Initialize job controller state
    let (jobs_state, rx) = JobsState::new(100);

    // Start job updater task
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    info!(
        "Server running at http://{}:{} (template {}, archive '{}')",
        host, port, config.report.template_id, config.report.root_folder_name
    );

    let config = web::Data::new(config);
    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(web::Data::new(jobs_state.clone()))
            .app_data(config.clone())
            .service(services::reports::configure_routes())
            .service(services::storage::configure_routes())
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
