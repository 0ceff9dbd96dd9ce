//! # Patchbay
//!
//! Channel/bus topology and real-time audio buffer routing.
//!
//! Patchbay is the processing core of an audio plugin engine. It parses a
//! compact channel I/O grammar into a validated multi-bus topology, checks
//! the legality of runtime channel arrangements, attaches host-supplied raw
//! buffers into a stable per-block scratch layout without allocating, and
//! routes bypassed audio through a delay line that reproduces the reported
//! latency exactly.
//!
//! ## Quick Start
//!
//! ```rust
//! use patchbay::prelude::*;
//!
//! struct Gain;
//!
//! impl AudioProcessor<f64> for Gain {
//!     fn process_block(
//!         &mut self,
//!         inputs: &BlockInputs<'_, f64>,
//!         outputs: &mut BlockOutputs<'_, f64>,
//!         _context: &ProcessContext<'_>,
//!     ) {
//!         for ch in 0..outputs.n_channels() {
//!             let input = inputs.channel(ch);
//!             let output = outputs.channel_mut(ch);
//!             for (o, i) in output.iter_mut().zip(input.iter()) {
//!                 *o = i * 0.5;
//!             }
//!         }
//!     }
//! }
//!
//! static CONFIG: ProcessorConfig = ProcessorConfig::new("1-1 2-2");
//!
//! let mut processor = Processor::new(&CONFIG, Gain).expect("valid I/O string");
//! assert!(processor.legal_io(Some(2), Some(2)));
//! processor.set_block_size(512);
//! ```
//!
//! A host adapter then drives the per-block sequence: `set_time_info`,
//! attach input/output buffers, `process_buffers`, and (for foreign-
//! precision hosts) a drain call.

pub use patchbay_core as core;

/// Prelude module for convenient imports.
///
/// ```rust
/// use patchbay::prelude::*;
/// ```
pub mod prelude {
    pub use patchbay_core::{
        // Per-block buffer views
        BlockInputs, BlockOutputs,
        // Bypass delay line
        NChanDelayLine,
        // Channel I/O model
        BusChannels, BusInfo, ChannelIo, ChannelIoError, IoConfig,
        // Sample trait for generic f32/f64 processing
        Sample,
        // Core trait and instance state
        AudioProcessor, Processor, ProcessorConfig,
        // Descriptor sizing
        Topology,
        // Transport
        ProcessContext, TimeInfo,
        // MIDI boundary type
        MidiMessage,
        // Limits and direction
        Direction, DEFAULT_SAMPLE_RATE, DEFAULT_TEMPO, MAX_BUSES, MAX_CHANNELS,
    };
}
