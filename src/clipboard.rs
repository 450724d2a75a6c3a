//! Best-effort clipboard copy of the sharing URL.

use tracing::{info, warn};

/// Copy `text` to the system clipboard. Failure is logged, never fatal.
///
/// Returns whether the copy succeeded.
pub fn copy_url(text: &str) -> bool {
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => match clipboard.set_text(text.to_owned()) {
            Ok(()) => {
                info!("Copied to clipboard: \"{}\"", text);
                true
            }
            Err(e) => {
                warn!("Error copying to clipboard: {}", e);
                false
            }
        },
        Err(e) => {
            warn!("Clipboard unavailable: {}", e);
            false
        }
    }
}
