mod classifier;
mod config;
mod error;
mod handlers;
mod labels;
mod models;
mod preprocess;
mod ranking;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use log::{error, info, warn};
use std::sync::Arc;

use crate::classifier::{Classifier, TractClassifier};
use crate::config::Config;
use crate::error::StartupError;
use crate::labels::Labels;

fn load_classifier(config: &Config) -> Result<Arc<dyn Classifier>, StartupError> {
    let labels = Labels::from_file(&config.labels_path)?;
    info!(
        "Loaded {} labels from {}",
        labels.len(),
        config.labels_path.display()
    );
    if labels.is_empty() {
        warn!("Label file is empty; predictions will be reported by class index");
    }

    info!("Loading model from {}", config.model_path.display());
    let classifier = TractClassifier::load(&config.model_path, labels)?;
    Ok(Arc::new(classifier))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let classifier = load_classifier(&config).map_err(|e| {
        error!("{}", e);
        std::io::Error::from(e)
    })?;
    let classifier = web::Data::from(classifier);

    let (host, port) = config.bind_addr();
    info!("Server running at http://{}:{}", host, port);

    let mut server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(classifier.clone())
            .configure(handlers::configure)
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    server.bind(config.bind_addr())?.run().await
}
