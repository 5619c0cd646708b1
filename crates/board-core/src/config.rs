use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ids::IdScheme;

pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSaveConfig {
    /// Delay after the last change before a debounced flush fires.
    #[serde(rename = "quiet_interval_ms", with = "duration_ms")]
    pub quiet_interval: Duration,
    pub enabled: bool,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            quiet_interval: DEFAULT_QUIET_INTERVAL,
            enabled: true,
        }
    }
}

impl AutoSaveConfig {
    pub fn quiet_interval(mut self, quiet_interval: Duration) -> Self {
        self.quiet_interval = quiet_interval;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub(crate) fn with_defaults(mut self) -> Self {
        if self.quiet_interval.is_zero() {
            self.quiet_interval = DEFAULT_QUIET_INTERVAL;
        }
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub ids: IdScheme,
    #[serde(default)]
    pub auto_save: AutoSaveConfig,
}

impl BoardConfig {
    pub fn ids(mut self, ids: IdScheme) -> Self {
        self.ids = ids;
        self
    }

    pub fn auto_save(mut self, auto_save: AutoSaveConfig) -> Self {
        self.auto_save = auto_save;
        self
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
