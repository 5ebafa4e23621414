use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use eatzi::auth::middleware::CredentialGate;
use eatzi::config::Config;
use eatzi::feedback::{FileStore, Ledger};
use eatzi::inference::{CLASS_LABELS, Predictor, check_label_count, load_classifier};
use eatzi::routes::{UploadLimit, configure_routes};
use std::fmt::Display;

fn startup_error(context: &str, err: impl Display) -> std::io::Error {
    log::error!("{}: {}", context, err);
    std::io::Error::other(format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    let classifier =
        load_classifier(&config.model_path).map_err(|e| startup_error("Model loading failed", e))?;
    check_label_count(classifier.as_ref(), CLASS_LABELS.len())
        .map_err(|e| startup_error("Model does not match class labels", e))?;
    let predictor = web::Data::new(Predictor::new(classifier, CLASS_LABELS));

    let store = FileStore::open(&config.data_dir)
        .map_err(|e| startup_error("Feedback storage unavailable", e))?;
    log::info!("Recording feedback in {}", config.data_dir.display());
    let ledger = web::Data::new(Ledger::new(store));

    let gate = CredentialGate::new(config.credentials.clone());
    let upload_limit = UploadLimit(config.max_upload_bytes);
    let bind_address = config.bind_address();

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(predictor.clone())
            .app_data(ledger.clone())
            .configure(|cfg| configure_routes(cfg, gate.clone(), upload_limit))
    })
    .bind(&bind_address)?
    .run()
    .await
}
