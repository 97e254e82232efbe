use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub probability: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub topk: Vec<Prediction>,
    pub inference_time_ms: f64,
    pub model_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub status: String,
    pub see: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub num_classes: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
