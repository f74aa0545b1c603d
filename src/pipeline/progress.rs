//! Progress bars for the per-item loops.

use indicatif::{ProgressBar, ProgressStyle};

const ITEM_TEMPLATE: &str = "{prefix:>8} [{bar:40}] {pos}/{len} {msg}";

/// A bar over `len` items, hidden unless `enabled`.
pub(crate) fn item_bar(enabled: bool, len: usize, prefix: &'static str) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(u64::try_from(len).unwrap_or(u64::MAX));
    bar.set_style(
        ProgressStyle::with_template(ITEM_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_prefix(prefix);
    bar
}
