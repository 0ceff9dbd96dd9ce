//! Core abstractions for the Patchbay audio engine: channel/bus topology
//! and real-time buffer routing.
//!
//! A processor declares the channel arrangements it supports with a compact
//! I/O string (`"1-1 2-2"`, `"1.1-1"`, `"0-2.2.2.2"`), parsed once at
//! construction into a validated multi-bus topology. Each processing block,
//! a host adapter attaches its raw sample buffers into a stable scratch
//! layout without allocating, and the core invokes the user's processing
//! handler, guaranteeing a valid (possibly silent) buffer behind every
//! declared channel slot. Bypass is routed through a multichannel delay
//! line reproducing the reported latency exactly.
//!
//! Host adapter layers (plugin-format FFI) live outside this crate; they
//! drive a [`Processor`] through the lifecycle and attachment calls and
//! forward its query surface to the host.

mod buffer;
mod bypass;
mod channel_io;
mod config;
mod error;
mod midi;
mod processor;
mod router;
mod sample;
mod topology;
mod transport;
mod types;

pub use buffer::{BlockInputs, BlockOutputs};
pub use bypass::NChanDelayLine;
pub use channel_io::{BusChannels, BusInfo, ChannelIo, IoConfig};
pub use config::ProcessorConfig;
pub use error::ChannelIoError;
pub use midi::MidiMessage;
pub use processor::{AudioProcessor, Processor};
pub use router::{BufferRouter, ChannelData};
pub use sample::{accumulate_slice, convert_slice, Sample};
pub use topology::Topology;
pub use transport::{ProcessContext, TimeInfo};
pub use types::{Direction, DEFAULT_SAMPLE_RATE, DEFAULT_TEMPO, MAX_BUSES, MAX_CHANNELS};
