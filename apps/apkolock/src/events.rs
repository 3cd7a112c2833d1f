//! Event handling and user feedback

use crate::logging::log_event_with_tracing;
use apkolock_events::{AppEvent, EventMessage, GeneralEvent, PublishEvent, ResolverEvent};
use console::{style, Term};

/// Logs every event and surfaces the ones a user should see on stderr
pub struct EventHandler {
    colors_enabled: bool,
    /// Suppress user-facing output, e.g. in JSON mode
    quiet: bool,
    term: Term,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, quiet: bool) -> Self {
        Self {
            colors_enabled,
            quiet,
            term: Term::stderr(),
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        log_event_with_tracing(&message);
        if self.quiet {
            return;
        }

        match message.event {
            AppEvent::General(GeneralEvent::Warning { message, context }) => {
                let line = match context {
                    Some(context) => format!("{message}: {context}"),
                    None => message,
                };
                self.show_warning(&line);
            }
            AppEvent::General(GeneralEvent::Error { message, details }) => {
                let line = match details {
                    Some(details) => format!("{message}: {details}"),
                    None => message,
                };
                self.show_error(&line);
            }
            AppEvent::Resolver(ResolverEvent::FanOutStarted { archs, .. }) => {
                self.show_status(&format!("Resolving for {}", archs.join(", ")));
            }
            AppEvent::Resolver(ResolverEvent::ArchFailed { arch, failure }) => {
                self.show_error(&format!("{arch}: {}", failure.message));
            }
            AppEvent::Publish(PublishEvent::PushRetrying {
                repository,
                attempt,
                delay_ms,
                error,
            }) => {
                self.show_warning(&format!(
                    "push to {repository} failed (attempt {attempt}), retrying in {delay_ms}ms: {error}"
                ));
            }
            _ => {}
        }
    }

    fn show_status(&self, message: &str) {
        let line = if self.colors_enabled {
            style(message).dim().to_string()
        } else {
            message.to_string()
        };
        let _ = self.term.write_line(&line);
    }

    fn show_warning(&self, message: &str) {
        let prefix = if self.colors_enabled {
            style("warning:").yellow().bold().to_string()
        } else {
            "warning:".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    fn show_error(&self, message: &str) {
        let prefix = if self.colors_enabled {
            style("error:").red().bold().to_string()
        } else {
            "error:".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }
}
