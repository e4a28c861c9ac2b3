pub mod device;
pub mod text;

pub use device::{device_key, DeviceRequest};
pub use text::{is_emoji, is_hex_id, preprocess_text, text_length, text_length_with_emojis};

/// Log a banner marking the start of a pipeline stage.
pub fn log_stage(title: &str) {
    tracing::info!("{} {} {}", "=".repeat(20), title, "=".repeat(20));
}
