
use indicatif::{ProgressBar, ProgressState, ProgressStyle};

/// Shared function to pull our progress bar styling
pub fn get_progress_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed_precise}] {msg:<12} {bar:40.cyan/blue} {pos}/{len} ({percent}); ETA: {eta_precise}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("percent", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{:.1}%", state.fraction()*100.0);
        })
        .progress_chars("##-")
}

/// Progress bar for one parallel pipeline stage
/// # Arguments
/// * `len` - number of work units in the stage
/// * `stage` - short label shown before the bar
pub fn stage_progress_bar(len: usize, stage: &str) -> ProgressBar {
    ProgressBar::new(len as u64)
        .with_style(get_progress_style())
        .with_message(stage.to_string())
}
