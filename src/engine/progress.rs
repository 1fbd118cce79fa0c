//! Progress bar utilities for displaying processing status

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

use crate::utils::config::ProgressConsts;

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Per-chunk callback handed to workers (argument: bytes just processed).
pub type ProgressFn = Arc<dyn Fn(usize) + Send + Sync>;

/// Byte progress bar over `total` bytes.
pub fn create_byte_bar(total: usize) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = total,
        desc = ProgressConsts::DESC,
        animation = Animation::Classic,
        unit = ProgressConsts::UNIT
    )))
}

/// Update progress bar if available
/// Uses try_lock so workers never block on the bar; a skipped update is caught up by the final refresh.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Push the bar to `total` and redraw once the run is over.
pub fn finish_bar(pb: &ProgressBar, total: usize) {
    if let Ok(mut bar) = pb.lock() {
        let _ = bar.update_to(total);
        let _ = bar.refresh();
    }
    eprintln!();
}

/// Create a progress callback function that updates the progress bar.
pub fn progress_callback(bar: &Option<ProgressBar>) -> Option<ProgressFn> {
    bar.as_ref().map(|bar| {
        let bar = Arc::clone(bar);
        Arc::new(move |n: usize| update_progress_bar(&bar, n)) as ProgressFn
    })
}
