//! Host collaborators for a terminal session.

use std::io::Write;

use checkmate_core::host::{BadgeSurface, Broadcaster, Delivery, Notifier};
use checkmate_core::{Notification, Push};

/// Writes notifications to stderr with a bell.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: &Notification) {
        eprintln!("\x07{}: {}", notification.title, notification.message);
    }
}

/// One-shot commands have nobody listening for pushes.
pub struct SilentBroadcaster;

impl Broadcaster for SilentBroadcaster {
    fn broadcast(&self, _push: &Push) -> Delivery {
        Delivery::NoListener
    }
}

/// Shows the badge text in the terminal window title.
pub struct TitleBadge;

impl BadgeSurface for TitleBadge {
    fn set_badge(&mut self, text: &str, _color: &str) {
        let title = if text.is_empty() {
            "checkmate".to_string()
        } else {
            format!("checkmate {text}")
        };
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "\x1b]0;{title}\x07");
        let _ = stderr.flush();
    }
}
