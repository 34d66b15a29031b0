//! Processor configuration.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Options shared by every processor.
///
/// Deserializes from any serde format; missing fields take their defaults.
///
/// ```rust
/// use std::time::Duration;
/// use schemastage_runner::ProcessorOptions;
///
/// let options = ProcessorOptions::new()
///     .preview_only(true)
///     .timeout(Duration::from_secs(30));
/// assert!(options.preview_only);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorOptions {
    /// Announce mutating statements without running them.
    pub preview_only: bool,
    /// Upper bound for each database round-trip, in seconds when serialized.
    #[serde(
        serialize_with = "serialize_seconds",
        deserialize_with = "deserialize_seconds"
    )]
    pub timeout: Option<Duration>,
    /// Backend-specific switches, passed through untouched.
    pub provider_switches: Option<String>,
}

impl ProcessorOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables preview mode.
    #[must_use]
    pub const fn preview_only(mut self, enabled: bool) -> Self {
        self.preview_only = enabled;
        self
    }

    /// Sets the per-statement timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the backend-specific switches.
    #[must_use]
    pub fn provider_switches(mut self, switches: impl Into<String>) -> Self {
        self.provider_switches = Some(switches.into());
        self
    }
}

#[allow(clippy::ref_option)]
fn serialize_seconds<S: Serializer>(
    timeout: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    timeout.map(|t| t.as_secs_f64()).serialize(serializer)
}

fn deserialize_seconds<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Duration>, D::Error> {
    let seconds = Option::<f64>::deserialize(deserializer)?;
    seconds
        .map(|s| Duration::try_from_secs_f64(s).map_err(serde::de::Error::custom))
        .transpose()
}
