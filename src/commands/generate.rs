//! Generate static files

use anyhow::Result;

use crate::generator::{GenerateReport, Generator};
use crate::Blog;

/// Generate the static site from the configured content source
pub async fn run(blog: &Blog) -> Result<GenerateReport> {
    let source = blog.content_source()?;
    let generator = Generator::new(blog, source)?;
    let report = generator.generate().await?;

    if report.skipped > 0 {
        tracing::warn!("Skipped {} posts", report.skipped);
    }
    if report.removed > 0 {
        tracing::info!("Removed {} stale posts", report.removed);
    }

    Ok(report)
}
