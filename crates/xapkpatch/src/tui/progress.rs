use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::time::Duration;

/// Progress narration goes to stdout; diagnostics stay on stderr.
pub static GLOBAL_MP: Lazy<MultiProgress> =
    Lazy::new(|| MultiProgress::with_draw_target(ProgressDrawTarget::stdout()));

pub fn create_spinner(message: impl Into<Cow<'static, str>>) -> ProgressBar {
    let pb = GLOBAL_MP.add(ProgressBar::new_spinner());
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["◜", "◠", "◝", "◞", "◡", "◟", "✔"])
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
