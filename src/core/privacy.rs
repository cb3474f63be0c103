//! Privacy filter seam.
//!
//! Scrubbing command lines and terminal output before they leave the
//! machine is the host application's concern. The dispatcher only needs
//! an opaque `filter(text) -> text` call, so it takes this trait as an
//! injected dependency and defaults to a pass-through.

/// Redacts sensitive material from text before it is sent to a provider.
pub trait PrivacyFilter: Send + Sync {
    /// Filter free-form text (context, error output, descriptions).
    fn filter(&self, text: &str) -> String;

    /// Filter a command line. Defaults to the free-form filter.
    fn filter_command(&self, command: &str) -> String {
        self.filter(command)
    }
}

/// No-op filter used when the host does not supply one.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughFilter;

impl PrivacyFilter for PassthroughFilter {
    fn filter(&self, text: &str) -> String {
        text.to_string()
    }
}
