use anyhow::Result;

use super::context::PipelineContext;

/// Check run result: if a fatal error was recorded (strict item failure, producer error, thread
/// panic), return it; otherwise log skipped items and hand them back.
/// Call after joining producer and workers.
pub fn check_for_first_error_or_skipped_items(ctx: &PipelineContext) -> Result<Vec<String>> {
    if let Some(msg) = ctx.take_first_error() {
        return Err(anyhow::anyhow!("{}", msg));
    }
    let skipped = ctx.take_skipped();
    if !skipped.is_empty() {
        log::warn!("Skipped {} items due to processing errors", skipped.len());
        if log::log_enabled!(log::Level::Debug) {
            for msg in &skipped {
                log::debug!("  skipped: {}", msg);
            }
        }
    }
    Ok(skipped)
}
