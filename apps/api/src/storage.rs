use anyhow::Result;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

/// S3 key for a freshly generated report. Each generation gets its own object.
pub fn report_key(property_id: Uuid, report_id: Uuid) -> String {
    format!("reports/{property_id}/{report_id}.pdf")
}

/// Uploads a finished report document to S3 / MinIO.
pub async fn upload_report(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    document: Bytes,
) -> Result<()> {
    let size = document.len();
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(document))
        .content_type("application/pdf")
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

    info!("Uploaded report ({size} bytes) to s3://{bucket}/{key}");
    Ok(())
}
