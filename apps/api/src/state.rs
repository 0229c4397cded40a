use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::report::assembler::{DocumentWriter, ReportRenderer};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub config: Config,
    /// Rasterizes report content. Default: the HTTP render service client.
    pub renderer: Arc<dyn ReportRenderer>,
    /// Turns page images into the final PDF. Default: the same render service client.
    pub writer: Arc<dyn DocumentWriter>,
}
