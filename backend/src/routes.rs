use actix_multipart::{Field, Multipart};
use actix_web::{Either, HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use log::{debug, error, info};
use serde::Deserialize;
use serde_json::json;
use shared::{ApiResponse, Vote};
use uuid::Uuid;

use crate::auth::middleware::CredentialGate;
use crate::feedback::Ledger;
use crate::inference::Predictor;

pub const WELCOME_BANNER: &str = "<p>Welcome This API Eatzi</p>";
pub const INVALID_VOTE_MESSAGE: &str =
    "Invalid value. Only \"1\" (like) or \"0\" (dislike) are accepted.";

/// Largest accepted upload for `/predict`, in bytes.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimit(pub usize);

#[derive(Debug, Deserialize)]
pub struct FeedbackForm {
    data: Option<String>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, gate: CredentialGate, upload_limit: UploadLimit) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(
            web::resource("/predict")
                .app_data(web::Data::new(upload_limit))
                .wrap(gate.clone())
                .route(web::post().to(predict)),
        )
        .service(
            web::resource("/feedback")
                .wrap(gate)
                .route(web::post().to(submit_feedback)),
        );
}

async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(WELCOME_BANNER)
}

enum Upload {
    Missing,
    Unnamed,
    TooLarge,
    File { filename: String, bytes: Vec<u8> },
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Option<Vec<u8>>, actix_web::Error> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let data = chunk?;
        if bytes.len() + data.len() > limit {
            return Ok(None);
        }
        bytes.extend_from_slice(&data);
    }
    Ok(Some(bytes))
}

/// Finds the `file` part. Parts without a filename are form values, not files.
async fn read_upload(payload: &mut Multipart, limit: usize) -> Result<Upload, actix_web::Error> {
    while let Ok(Some(mut field)) = payload.try_next().await {
        if field.name() != Some("file") {
            continue;
        }
        let Some(filename) = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned)
        else {
            continue;
        };
        if filename.is_empty() {
            return Ok(Upload::Unnamed);
        }

        return Ok(match read_field(&mut field, limit).await? {
            Some(bytes) => Upload::File { filename, bytes },
            None => Upload::TooLarge,
        });
    }
    Ok(Upload::Missing)
}

async fn predict(
    predictor: web::Data<Predictor>,
    upload_limit: web::Data<UploadLimit>,
    mut payload: Multipart,
) -> Result<HttpResponse, actix_web::Error> {
    let (filename, image) = match read_upload(&mut payload, upload_limit.0).await? {
        Upload::File { filename, bytes } => (filename, bytes),
        Upload::Missing => {
            return Ok(HttpResponse::BadRequest()
                .json(json!({"success": false, "message": "No file part in the request"})));
        }
        Upload::Unnamed => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::fail("No selected file")));
        }
        Upload::TooLarge => {
            return Ok(HttpResponse::PayloadTooLarge().json(ApiResponse::<()>::fail(format!(
                "File exceeds the {} byte upload limit",
                upload_limit.0
            ))));
        }
    };

    let request_id = Uuid::new_v4();
    debug!(
        "Prediction {} received {} ({} bytes)",
        request_id,
        filename,
        image.len()
    );

    let predictor = predictor.clone();
    let outcome = web::block(move || predictor.predict(&image)).await;

    let response = match outcome {
        Ok(Ok(prediction)) => {
            info!(
                "Prediction {}: {} ({:.4})",
                request_id, prediction.predicted_class, prediction.confidence
            );
            HttpResponse::Ok().json(ApiResponse::ok("Prediction successful", prediction))
        }
        Ok(Err(e)) => {
            error!("Prediction {} failed: {}", request_id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::fail_with_error("Prediction failed", e))
        }
        Err(e) => {
            error!("Prediction {} did not complete: {}", request_id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::fail_with_error("Prediction failed", e))
        }
    };
    Ok(response)
}

/// Value of the multipart field `data`, if it is present and UTF-8.
async fn read_vote_field(payload: &mut Multipart) -> Result<Option<String>, actix_web::Error> {
    while let Ok(Some(mut field)) = payload.try_next().await {
        if field.name() != Some("data") {
            continue;
        }
        return Ok(read_field(&mut field, 16)
            .await?
            .and_then(|bytes| String::from_utf8(bytes).ok()));
    }
    Ok(None)
}

async fn submit_feedback(
    ledger: web::Data<Ledger>,
    body: Either<web::Form<FeedbackForm>, Multipart>,
) -> Result<HttpResponse, actix_web::Error> {
    let value = match body {
        Either::Left(form) => form.into_inner().data,
        Either::Right(mut payload) => read_vote_field(&mut payload).await?,
    };

    let vote = match value.as_deref().map(str::parse::<Vote>) {
        Some(Ok(vote)) => vote,
        _ => {
            debug!("Rejected feedback value {:?}", value);
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::fail(INVALID_VOTE_MESSAGE)));
        }
    };

    let ledger = ledger.clone();
    let response = match web::block(move || ledger.record(vote)).await {
        Ok(Ok(counters)) => {
            HttpResponse::Ok().json(ApiResponse::ok("Feedback recorded successfully.", counters))
        }
        Ok(Err(e)) => {
            error!("Failed to record {} feedback: {}", vote, e);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::fail_with_error(
                "Error while recording feedback.",
                e,
            ))
        }
        Err(e) => {
            error!("Feedback task for {} did not complete: {}", vote, e);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::fail_with_error(
                "Error while recording feedback.",
                e,
            ))
        }
    };
    Ok(response)
}
