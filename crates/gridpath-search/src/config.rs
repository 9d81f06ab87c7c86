use std::time::Duration;

/// How the engine is driven once a search starts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Extract and expand cells on its own, pausing between steps.
    #[default]
    Automatic,
    /// Expand only the cells named by the caller through `advance`.
    Interactive,
}

/// Parameters chosen once when a search is started.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    pub mode: Mode,
    /// Pause between automatic steps. 0 runs to completion without pausing.
    pub delay_ms: u64,
}

impl SearchConfig {
    /// Set the mode (builder).
    pub const fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the delay between automatic steps (builder).
    pub const fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    #[inline]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
