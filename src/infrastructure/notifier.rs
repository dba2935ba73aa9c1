//! Terminal notifications.

use colored::Colorize;

use crate::application::exporter::{Notification, Notifier, Variant};

/// Prints notifications to stderr as one-line toasts.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        eprintln!("{}", render(&notification));
    }
}

fn render(n: &Notification) -> String {
    match n.variant {
        Variant::Default => format!("{} {}", format!("{}:", n.title).green().bold(), n.description),
        Variant::Destructive => format!("{} {}", format!("{}:", n.title).red().bold(), n.description),
    }
}
