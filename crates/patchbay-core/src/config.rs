//! Compile-time processor configuration.
//!
//! A plugin declares its channel I/O string and static traits once, as a
//! `const`, and hands the config to [`Processor::new`](crate::Processor::new)
//! at construction:
//!
//! ```ignore
//! use patchbay_core::ProcessorConfig;
//!
//! static CONFIG: ProcessorConfig = ProcessorConfig::new("1-1 2-2")
//!     .with_latency(256)
//!     .with_midi();
//! ```

/// Static description of a processor: its channel I/O grammar string and
/// compile-time traits.
#[derive(Clone, Copy, Debug)]
pub struct ProcessorConfig {
    /// Channel I/O configuration string (see [`crate::ChannelIo`]).
    pub channel_io: &'static str,
    /// Latency reported to the host at construction, in samples.
    pub latency: usize,
    /// Whether the plugin is an instrument (generator) rather than an effect.
    pub is_instrument: bool,
    /// Whether the plugin accepts MIDI input.
    pub does_midi: bool,
}

impl ProcessorConfig {
    /// Config with the given channel I/O string and all traits defaulted.
    pub const fn new(channel_io: &'static str) -> Self {
        Self {
            channel_io,
            latency: 0,
            is_instrument: false,
            does_midi: false,
        }
    }

    /// Set the initial latency in samples.
    pub const fn with_latency(mut self, latency: usize) -> Self {
        self.latency = latency;
        self
    }

    /// Mark the plugin as an instrument.
    pub const fn as_instrument(mut self) -> Self {
        self.is_instrument = true;
        self
    }

    /// Mark the plugin as accepting MIDI input.
    pub const fn with_midi(mut self) -> Self {
        self.does_midi = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        const CONFIG: ProcessorConfig = ProcessorConfig::new("0-2.2.2.2")
            .with_latency(64)
            .as_instrument()
            .with_midi();
        assert_eq!(CONFIG.channel_io, "0-2.2.2.2");
        assert_eq!(CONFIG.latency, 64);
        assert!(CONFIG.is_instrument);
        assert!(CONFIG.does_midi);
    }
}
