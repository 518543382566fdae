//! Out-of-band notification dispatch.
//!
//! The PIN reset flow hands a temporary PIN to the patient over SMS. The
//! gateway is an external collaborator behind the [`Notifier`] trait;
//! delivery is fire-and-forget and a failed send never rolls back the
//! credential change that triggered it.

use tracing::info;

/// Dispatches a message to a destination (phone number).
pub trait Notifier: Send + Sync {
    fn send(&self, destination: &str, message: &str);
}

/// Logs outbound messages instead of hitting a real SMS gateway.
pub struct SmsLogNotifier;

impl Notifier for SmsLogNotifier {
    fn send(&self, destination: &str, _message: &str) {
        // The message body carries a credential; log the dispatch, not the
        // content.
        info!(destination = %destination, "SMS dispatched");
    }
}

/// Test double used by the integration suite.
pub mod testing {
    use super::Notifier;
    use std::sync::Mutex;

    /// Captures sent messages for assertions.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(String, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn send(&self, destination: &str, message: &str) {
            self.sent
                .lock()
                .unwrap()
                .push((destination.to_string(), message.to_string()));
        }
    }
}
