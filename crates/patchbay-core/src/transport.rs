//! Host transport state, snapshotted once per processing block.

use crate::types::DEFAULT_TEMPO;

/// Snapshot of the host transport for one block.
///
/// Overwritten wholesale before each processing call; there are no partial
/// updates. Positions default to -1.0 (unknown) until the host supplies
/// them, matching the convention plugin hosts use for "no timeline yet".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeInfo {
    /// Tempo in beats per minute.
    pub tempo: f64,
    /// Samples elapsed since the start of the project timeline.
    pub sample_pos: f64,
    /// Musical position in quarter notes.
    pub ppq_pos: f64,
    /// Musical position of the last bar start, in quarter notes.
    pub last_bar: f64,
    /// Loop start in quarter notes, if the host loops.
    pub cycle_start: f64,
    /// Loop end in quarter notes, if the host loops.
    pub cycle_end: f64,
    /// Upper part of the time signature (the "6" in 6/8).
    pub numerator: i32,
    /// Lower part of the time signature (the "8" in 6/8).
    pub denominator: i32,
    /// Whether the transport is rolling.
    pub transport_is_running: bool,
    /// Whether loop playback is enabled.
    pub transport_loop_enabled: bool,
}

impl Default for TimeInfo {
    fn default() -> Self {
        Self {
            tempo: DEFAULT_TEMPO,
            sample_pos: -1.0,
            ppq_pos: -1.0,
            last_bar: -1.0,
            cycle_start: -1.0,
            cycle_end: -1.0,
            numerator: 4,
            denominator: 4,
            transport_is_running: false,
            transport_loop_enabled: false,
        }
    }
}

/// Read-only context handed to user processing code for one block.
pub struct ProcessContext<'a> {
    /// Current sample rate in Hz.
    pub sample_rate: f64,
    /// Whether the host is rendering offline (non-real-time bounce).
    pub rendering_offline: bool,
    /// The transport snapshot for this block.
    pub time_info: &'a TimeInfo,
}

impl ProcessContext<'_> {
    /// Samples per beat at the current tempo: `(60 / tempo) * sample_rate`.
    ///
    /// A positive, finite tempo is the host's contract; this is a plain
    /// projection and yields a meaningless (but non-crashing) value for
    /// degenerate tempi.
    pub fn samples_per_beat(&self) -> f64 {
        60.0 / self.time_info.tempo * self.sample_rate
    }
}
