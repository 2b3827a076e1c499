use crate::alerter::Alerter;
use crate::errors::Result;

/// Thin facade exposing [`Alerter`] functionality to an RPC surface.
///
/// Destinations have the form `transport:endpoint` where transport is
/// `http` or `smtp` (https urls go through the `http` transport), for
/// example `http:https://example.com/alert` or `smtp:alert@example.com`.
/// SMTP configuration must be supplied for the smtp transport to work.
pub struct AlerterApi {
    alerter: Alerter,
}

impl AlerterApi {
    pub fn new(alerter: Alerter) -> Self {
        AlerterApi { alerter }
    }

    /// Delegates to [`Alerter::register_destination`].
    pub fn register_destination(&mut self, destination: &str) -> Result<bool> {
        self.alerter.register_destination(destination)
    }

    /// Delegates to [`Alerter::list_destinations`].
    pub fn list_destinations(&self) -> Vec<String> {
        self.alerter.list_destinations()
    }

    /// Delegates to [`Alerter::send_alert`].
    pub fn send_test_alert(&self, subject: &str, message: &str) -> Result<()> {
        self.alerter.send_alert(subject, message)
    }
}
