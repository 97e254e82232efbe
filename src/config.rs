use clap::Parser;
use std::path::PathBuf;

/// Serve a pretrained ImageNet classifier over HTTP.
#[derive(Debug, Clone, Parser)]
#[command(name = "resnet-serve", version)]
pub struct Config {
    /// Interface to bind
    #[arg(long, env = "RESNET_SERVE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to serve on
    #[arg(short, long, env = "RESNET_SERVE_PORT", default_value_t = 8000)]
    pub port: u16,

    /// ONNX export of the pretrained network
    #[arg(long, env = "RESNET_SERVE_MODEL", default_value = "model/resnet50.onnx")]
    pub model_path: PathBuf,

    /// Class names, one per line, in output order
    #[arg(long, env = "RESNET_SERVE_LABELS", default_value = "model/imagenet_classes.txt")]
    pub labels_path: PathBuf,

    /// HTTP worker threads (defaults to one per core)
    #[arg(long, env = "RESNET_SERVE_WORKERS")]
    pub workers: Option<usize>,
}

impl Config {
    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}
