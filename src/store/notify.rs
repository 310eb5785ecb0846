/// Delivers password reset links to the account owner.
pub trait ResetNotifier: Send + Sync {
    fn deliver(&self, email: &str, link: &str);
}

/// Writes the link to the log. Stands in for a mail relay in development.
pub struct LogNotifier;

impl ResetNotifier for LogNotifier {
    fn deliver(&self, email: &str, link: &str) {
        tracing::info!(email = %email, reset_link = %link, "Password reset link issued");
    }
}
