//! Configuration for the trace-context protocol.

use std::fmt;
use std::sync::Arc;

use crate::sampling::{RateSampler, SamplingSource};

/// Configuration shared by the trace contexts of one monitored
/// application.
///
/// # Examples
///
/// ```
/// use distributed_trace::TraceOptions;
///
/// let options = TraceOptions {
///     application_id: "46954".into(),
///     cross_process_id: "190#222".into(),
///     ..Default::default()
/// };
/// assert_eq!(options.account_id(), "190");
/// ```
#[derive(Clone)]
pub struct TraceOptions {
    /// Whether distributed tracing is enabled.
    ///
    /// On a disabled context, payload creation and acceptance are no-ops
    /// returning nothing, without error.
    pub enabled: bool,
    /// The local application identifier, used as the caller app id on
    /// outbound payloads.
    pub application_id: String,
    /// The combined `"account#application"` identifier inherited from the
    /// predecessor cross-process protocol. The account part becomes the
    /// caller account id on outbound payloads.
    pub cross_process_id: String,
    /// The sampling decision source consulted when no upstream sampling
    /// intent is available.
    pub sampler: Arc<dyn SamplingSource>,
}

impl TraceOptions {
    /// Creates new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates new options and immediately configures them.
    pub fn configure<F>(f: F) -> Self
    where
        F: FnOnce(&mut TraceOptions) -> &mut TraceOptions,
    {
        let mut opts = Self::new();
        f(&mut opts);
        opts
    }

    /// The account part of
    /// [`cross_process_id`](Self::cross_process_id): everything before the
    /// first `#`.
    pub fn account_id(&self) -> &str {
        self.cross_process_id.split('#').next().unwrap_or_default()
    }
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            application_id: String::new(),
            cross_process_id: String::new(),
            sampler: Arc::new(RateSampler::new(1.0)),
        }
    }
}

impl fmt::Debug for TraceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceOptions")
            .field("enabled", &self.enabled)
            .field("application_id", &self.application_id)
            .field("cross_process_id", &self.cross_process_id)
            .finish()
    }
}
