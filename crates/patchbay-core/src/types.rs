//! System-wide limits and shared primitive types.

/// Maximum number of buses per direction.
///
/// Host adapters size fixed tables against this; topologies declaring more
/// buses are rejected at construction.
pub const MAX_BUSES: usize = 16;

/// Maximum number of channels on a single bus.
///
/// Also serves as the practical upper bound assumed for wildcard buses when
/// sizing channel-descriptor arrays, since a wildcard channel count is only
/// known after host negotiation.
pub const MAX_CHANNELS: usize = 32;

/// Sample rate assumed before the host has provided one.
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// Tempo assumed before the host has provided a transport snapshot.
pub const DEFAULT_TEMPO: f64 = 120.0;

/// Audio signal direction, viewed from the processor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Audio flowing into the processor.
    Input,
    /// Audio flowing out of the processor.
    Output,
}

impl Direction {
    /// Lowercase name used when synthesizing default channel labels.
    pub fn label_stem(&self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}
