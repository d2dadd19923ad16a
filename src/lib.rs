pub mod api;
pub mod config;
pub mod pipeline;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::ServiceConfig;
use crate::pipeline::handwriting::HandwritingPipeline;

pub fn run() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Blocking HTTP clients live in here, so the pipeline is built and finally
    // dropped outside the async runtime.
    let pipeline = match HandwritingPipeline::from_config(&config) {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => {
            tracing::error!("Failed to initialize recognition pipeline: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        bind_addr = %config.bind_addr,
        model = %config.gemini_model,
        gemini_key_set = !config.gemini_api_key.is_empty(),
        vision_key_set = !config.vision_api_key.is_empty(),
        "Configuration loaded"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("error while building tokio runtime");

    if let Err(e) = runtime.block_on(api::serve(config.bind_addr, pipeline.clone())) {
        tracing::error!("API server error: {e}");
    }

    drop(runtime);
    drop(pipeline);
}
