pub mod pause;
pub mod progress;
