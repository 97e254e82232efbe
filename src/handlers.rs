use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::classifier::Classifier;
use crate::error::PredictError;
use crate::models::{HealthResponse, Prediction, PredictionResponse, RootResponse};
use crate::preprocess;
use crate::ranking::{round_to, softmax, top_k};

/// Largest accepted upload, inclusive.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Multipart field carrying the image.
pub const UPLOAD_FIELD: &str = "file";

const TOP_K: usize = 5;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(root)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/predict").route(web::post().to(predict)));
}

pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(RootResponse {
        status: "ok".to_string(),
        see: vec!["/health".to_string(), "/predict".to_string()],
    })
}

pub async fn health(classifier: web::Data<dyn Classifier>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        model: classifier.model_name().to_string(),
        num_classes: classifier.labels().len(),
    })
}

pub async fn predict(
    classifier: web::Data<dyn Classifier>,
    payload: Multipart,
) -> Result<HttpResponse, PredictError> {
    let request_id = Uuid::new_v4();
    let result = run_prediction(classifier.into_inner(), payload).await;

    match &result {
        Ok(response) => {
            let best = response.topk.first().map_or("-", |p| p.label.as_str());
            info!(
                "[{}] predicted {:?} in {} ms",
                request_id, best, response.inference_time_ms
            );
        }
        Err(PredictError::InferenceFailed(cause)) => {
            error!("[{}] inference failed: {}", request_id, cause);
        }
        Err(e) => warn!("[{}] rejected upload: {}", request_id, e),
    }

    result.map(|response| HttpResponse::Ok().json(response))
}

async fn run_prediction(
    classifier: Arc<dyn Classifier>,
    payload: Multipart,
) -> Result<PredictionResponse, PredictError> {
    let bytes = read_upload(payload).await?;
    web::block(move || classify(classifier.as_ref(), &bytes))
        .await
        .map_err(|e| PredictError::InferenceFailed(e.to_string()))?
}

/// Pull the image field out of the multipart stream.
///
/// The declared content type is checked before any body bytes are read, and
/// reading stops as soon as the upload grows past `MAX_UPLOAD_BYTES`.
async fn read_upload(mut payload: Multipart) -> Result<Vec<u8>, PredictError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|_| PredictError::MalformedUpload)?;
        if field.content_disposition().get_name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let declared = field
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        if !is_image_type(declared) {
            return Err(PredictError::InvalidFileType);
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|_| PredictError::MalformedUpload)?;
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(PredictError::FileTooLarge);
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(bytes);
    }

    Err(PredictError::MissingFile)
}

fn is_image_type(content_type: Option<&str>) -> bool {
    content_type.map_or(false, |ct| ct.starts_with("image/"))
}

/// Decode, preprocess and run the network over one upload. CPU bound; callers
/// on the async workers go through `web::block`.
pub fn classify(
    classifier: &dyn Classifier,
    bytes: &[u8],
) -> Result<PredictionResponse, PredictError> {
    let image = preprocess::decode(bytes)?;
    let input = classifier.preprocess().apply(&image);

    let start = Instant::now();
    let logits = classifier.forward(input)?;
    let probs = softmax(&logits);
    let best = top_k(&probs, TOP_K);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    let labels = classifier.labels();
    let topk = best
        .into_iter()
        .map(|(index, probability)| Prediction {
            label: labels.label_for(index),
            probability: round_to(probability as f64, 6),
        })
        .collect();

    Ok(PredictionResponse {
        topk,
        inference_time_ms: round_to(elapsed_ms, 3),
        model_name: classifier.model_name().to_string(),
    })
}
