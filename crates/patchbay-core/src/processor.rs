//! Per-instance processor state: topology, routing, lifecycle and the
//! processing entry point.
//!
//! [`Processor`] is the object a host adapter drives. It parses the channel
//! I/O string once at construction, sizes the descriptor arrays for the
//! worst case, and then, per block: receives a transport snapshot, has host
//! buffers attached, and invokes either the user's [`AudioProcessor`] or the
//! latency-compensated bypass path.
//!
//! # Threading
//!
//! One real-time audio thread calls the per-block sequence; a lower-priority
//! control thread may call accessors and request latency/block-size/sample-
//! rate changes. The audio thread never blocks on the control thread: every
//! mutation that affects buffer sizing (block size, sample rate, latency,
//! renegotiated channel counts) takes effect only at host-guaranteed
//! synchronization points (construction, [`Processor::set_active`],
//! [`Processor::reset`]) which the host promises not to overlap with a
//! processing call. That calling contract, not an internal lock, provides
//! mutual exclusion.

use log::debug;

use crate::buffer::{BlockInputs, BlockOutputs};
use crate::bypass::NChanDelayLine;
use crate::channel_io::{ChannelIo, IoConfig};
use crate::config::ProcessorConfig;
use crate::error::ChannelIoError;
use crate::midi::MidiMessage;
use crate::router::BufferRouter;
use crate::sample::Sample;
use crate::topology::Topology;
use crate::transport::{ProcessContext, TimeInfo};
use crate::types::{Direction, DEFAULT_SAMPLE_RATE};

/// The user-overridable processing capability.
///
/// The routing core owns an implementation and invokes it at defined
/// points; it never knows the concrete behavior, only this contract.
///
/// `process_block` runs on the high-priority audio thread. Implementations
/// must not allocate, lock, or perform blocking I/O. Every declared input
/// channel is readable for the full block (silent if the host connected
/// nothing) and every declared output channel is writable.
pub trait AudioProcessor<S: Sample> {
    /// Process one block of audio.
    fn process_block(
        &mut self,
        inputs: &BlockInputs<'_, S>,
        outputs: &mut BlockOutputs<'_, S>,
        context: &ProcessContext<'_>,
    );

    /// Called at transport reset or after a sample-rate change, before the
    /// next block. Clear buffers, re-derive coefficients.
    fn on_reset(&mut self) {}

    /// Called when the host switches the plugin on or off a track, once the
    /// channel arrangement is known.
    fn on_activate(&mut self, _active: bool) {}

    /// Called for each incoming MIDI message, before the block it applies to.
    fn on_midi(&mut self, _message: &MidiMessage) {}
}

/// Instance-scoped routing core wrapping a user [`AudioProcessor`].
pub struct Processor<S: Sample, P: AudioProcessor<S>> {
    handler: P,
    channel_io: ChannelIo,
    topology: Topology,
    router: BufferRouter<S>,
    sample_rate: f64,
    latency: usize,
    tail_size: usize,
    bypassed: bool,
    rendering_offline: bool,
    is_instrument: bool,
    does_midi: bool,
    time_info: TimeInfo,
    /// Delays the bypassed signal by the reported latency. Rebuilt only at
    /// lifecycle synchronization points; `None` while latency is zero.
    latency_delay: Option<NChanDelayLine<S>>,
}

impl<S: Sample, P: AudioProcessor<S>> Processor<S, P> {
    /// Parse the channel I/O string and size the descriptor arrays.
    ///
    /// A malformed string is an authoring defect: construction fails and no
    /// usable instance exists.
    pub fn new(config: &ProcessorConfig, handler: P) -> Result<Self, ChannelIoError> {
        let channel_io = ChannelIo::parse(config.channel_io)?;
        let topology = Topology::from_channel_io(&channel_io);
        let router = BufferRouter::new(&topology);

        debug!(
            "processor: {} config(s), {} input slot(s), {} output slot(s), latency {}",
            channel_io.n_configs(),
            router.n_channels(Direction::Input),
            router.n_channels(Direction::Output),
            config.latency,
        );

        Ok(Self {
            handler,
            channel_io,
            topology,
            router,
            sample_rate: DEFAULT_SAMPLE_RATE,
            latency: config.latency,
            tail_size: 0,
            bypassed: false,
            rendering_offline: false,
            is_instrument: config.is_instrument,
            does_midi: config.does_midi,
            time_info: TimeInfo::default(),
            latency_delay: None,
        })
    }

    /// The wrapped processing handler.
    pub fn handler(&self) -> &P {
        &self.handler
    }

    /// Mutable access to the wrapped processing handler.
    pub fn handler_mut(&mut self) -> &mut P {
        &mut self.handler
    }

    // =========================================================================
    // Topology queries
    // =========================================================================

    /// Max bus count for one direction across all channel I/O configs.
    pub fn max_buses(&self, direction: Direction) -> usize {
        self.channel_io.max_buses(direction)
    }

    /// Max channel count possible on one bus position; 0 for positions no
    /// config defines.
    pub fn max_channels_for_bus(&self, direction: Direction, bus: usize) -> usize {
        self.topology.max_channels_for_bus(direction, bus)
    }

    /// Whether any config declares a wildcard bus in one direction.
    pub fn has_wildcard_bus(&self, direction: Direction) -> bool {
        self.channel_io.has_wildcard_bus(direction)
    }

    /// Number of channel I/O configs parsed from the configuration string.
    pub fn io_config_count(&self) -> usize {
        self.channel_io.n_configs()
    }

    /// A parsed config by index, if it exists.
    pub fn io_config(&self, idx: usize) -> Option<&IoConfig> {
        self.channel_io.config(idx)
    }

    /// The full parsed channel I/O declaration.
    pub fn channel_io(&self) -> &ChannelIo {
        &self.channel_io
    }

    /// Total declared input channel slots (worst case over all configs).
    pub fn input_channel_count(&self) -> usize {
        self.router.n_channels(Direction::Input)
    }

    /// Total declared output channel slots (worst case over all configs).
    pub fn output_channel_count(&self) -> usize {
        self.router.n_channels(Direction::Output)
    }

    /// Check whether a candidate channel-count pair is legal; `None` on a
    /// side means "don't care". Hosts call this during arrangement
    /// negotiation, before activation.
    pub fn legal_io(&self, n_inputs: Option<usize>, n_outputs: Option<usize>) -> bool {
        self.channel_io.legal_io(n_inputs, n_outputs)
    }

    /// Whether any config declares more than one input bus, i.e. the plugin
    /// has a sidechain input (not necessarily active in the current config).
    pub fn has_sidechain_input(&self) -> bool {
        self.channel_io.max_buses(Direction::Input) > 1
    }

    /// Worst-case channel count across the non-main input buses.
    pub fn sidechain_channel_count(&self) -> usize {
        self.topology.n_channels(Direction::Input)
            - self.topology.max_channels_for_bus(Direction::Input, 0)
    }

    /// Whether the plugin was configured as an instrument.
    pub fn is_instrument(&self) -> bool {
        self.is_instrument
    }

    /// Whether the plugin was configured to accept MIDI.
    pub fn does_midi(&self) -> bool {
        self.does_midi
    }

    // =========================================================================
    // Channel connections and labels
    // =========================================================================

    /// Mark a range of input slots connected/unconnected.
    pub fn set_input_connections(&mut self, idx: usize, n: usize, connected: bool) {
        self.router.set_input_channel_connections(idx, n, connected);
    }

    /// Mark a range of output slots connected/unconnected.
    pub fn set_output_connections(&mut self, idx: usize, n: usize, connected: bool) {
        self.router.set_output_channel_connections(idx, n, connected);
    }

    /// Whether the host connected an input channel.
    pub fn is_input_connected(&self, idx: usize) -> bool {
        self.router.is_connected(Direction::Input, idx)
    }

    /// Whether the host connected an output channel.
    pub fn is_output_connected(&self, idx: usize) -> bool {
        self.router.is_connected(Direction::Output, idx)
    }

    /// Number of connected input channels. Assumes connections are
    /// contiguous from channel 0.
    pub fn connected_input_count(&self) -> usize {
        self.router.n_connected(Direction::Input)
    }

    /// Number of connected output channels. Assumes connections are
    /// contiguous from channel 0.
    pub fn connected_output_count(&self) -> usize {
        self.router.n_connected(Direction::Output)
    }

    /// Label an input channel (e.g. "W", "X", "Y", "Z" for ambisonics).
    pub fn set_input_label(&mut self, idx: usize, label: &str) {
        self.router.set_label(Direction::Input, idx, label);
    }

    /// Label an output channel.
    pub fn set_output_label(&mut self, idx: usize, label: &str) {
        self.router.set_label(Direction::Output, idx, label);
    }

    /// An input channel's label, if the slot exists.
    pub fn input_label(&self, idx: usize) -> Option<&str> {
        self.router.label(Direction::Input, idx)
    }

    /// An output channel's label, if the slot exists.
    pub fn output_label(&self, idx: usize) -> Option<&str> {
        self.router.label(Direction::Output, idx)
    }

    // =========================================================================
    // Instance state
    // =========================================================================

    /// Current sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Set the sample rate. Lifecycle-point only.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    /// Current block size in samples.
    pub fn block_size(&self) -> usize {
        self.router.block_size()
    }

    /// Resize the scratch layout for a new maximum block length.
    /// Lifecycle-point only: allocates.
    pub fn set_block_size(&mut self, block_size: usize) {
        debug!("block size -> {block_size}");
        self.router.set_block_size(block_size);
    }

    /// Latency in samples as last reported.
    pub fn latency(&self) -> usize {
        self.latency
    }

    /// Report a new latency. Takes effect in the bypass path at the next
    /// lifecycle synchronization point ([`set_active`](Self::set_active) or
    /// [`reset`](Self::reset)); the host adapter is responsible for
    /// forwarding the value to the host.
    pub fn set_latency(&mut self, latency: usize) {
        debug!("latency -> {latency}");
        self.latency = latency;
    }

    /// Tail size in samples (e.g. reverb decay past the end of input).
    pub fn tail_size(&self) -> usize {
        self.tail_size
    }

    /// Update the tail size.
    pub fn set_tail_size(&mut self, tail_size: usize) {
        self.tail_size = tail_size;
    }

    /// Whether the plugin is currently bypassed.
    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Engage or release bypass. Touches nothing but the flag: topology,
    /// labels and the parsed config list are unaffected, and the delay
    /// history is only cleared at lifecycle points.
    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    /// Whether the host is rendering offline.
    pub fn is_rendering_offline(&self) -> bool {
        self.rendering_offline
    }

    /// Flag offline (non-real-time) rendering.
    pub fn set_rendering_offline(&mut self, rendering_offline: bool) {
        self.rendering_offline = rendering_offline;
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Overwrite the transport snapshot for the upcoming block.
    pub fn set_time_info(&mut self, time_info: TimeInfo) {
        self.time_info = time_info;
    }

    /// The latest transport snapshot.
    pub fn time_info(&self) -> &TimeInfo {
        &self.time_info
    }

    /// Samples elapsed since the start of the project timeline.
    pub fn sample_pos(&self) -> f64 {
        self.time_info.sample_pos
    }

    /// Tempo in beats per minute.
    pub fn tempo(&self) -> f64 {
        self.time_info.tempo
    }

    /// Current time signature as (numerator, denominator).
    pub fn time_signature(&self) -> (i32, i32) {
        (self.time_info.numerator, self.time_info.denominator)
    }

    /// Samples per beat at the current tempo and sample rate. A positive,
    /// finite tempo is the host's contract.
    pub fn samples_per_beat(&self) -> f64 {
        60.0 / self.time_info.tempo * self.sample_rate
    }

    // =========================================================================
    // Buffer attachment (real-time path)
    // =========================================================================

    /// Attach host input buffers, native precision. See
    /// [`BufferRouter::attach_input_buffers`].
    ///
    /// # Safety
    ///
    /// Every non-null pointer in `ppdata` must be valid for `n_frames`
    /// reads for the duration of the current processing call.
    pub unsafe fn attach_input_buffers(
        &mut self,
        idx: usize,
        n: usize,
        ppdata: &[*const S],
        n_frames: usize,
    ) {
        // SAFETY: Forwarded caller contract.
        unsafe { self.router.attach_input_buffers(idx, n, ppdata, n_frames) }
    }

    /// Attach host input buffers of a foreign sample type, converting into
    /// pre-sized scratch. See
    /// [`BufferRouter::attach_input_buffers_converting`].
    ///
    /// # Safety
    ///
    /// Every non-null pointer in `ppdata` must be valid for `n_frames`
    /// reads for the duration of the current processing call.
    pub unsafe fn attach_input_buffers_converting<F: Sample>(
        &mut self,
        idx: usize,
        n: usize,
        ppdata: &[*const F],
        n_frames: usize,
    ) {
        // SAFETY: Forwarded caller contract.
        unsafe {
            self.router
                .attach_input_buffers_converting(idx, n, ppdata, n_frames)
        }
    }

    /// Attach host output buffers, native precision: the engine writes
    /// straight into host memory. See [`BufferRouter::attach_output_buffers`].
    ///
    /// # Safety
    ///
    /// Every non-null pointer in `ppdata` must be valid for writes of one
    /// full block for the duration of the current processing call, and no
    /// two pointers may alias.
    pub unsafe fn attach_output_buffers(&mut self, idx: usize, n: usize, ppdata: &[*mut S]) {
        // SAFETY: Forwarded caller contract.
        unsafe { self.router.attach_output_buffers(idx, n, ppdata) }
    }

    /// Route a range of output slots into engine scratch, for foreign-
    /// precision hosts; pair with a drain call after processing.
    pub fn attach_output_scratch(&mut self, idx: usize, n: usize) {
        self.router.attach_output_scratch(idx, n);
    }

    /// Deliver scratch output into host buffers, overwriting. See
    /// [`BufferRouter::drain_output_buffers`].
    ///
    /// # Safety
    ///
    /// Every non-null pointer in `ppdata` must be valid for `n_frames`
    /// writes for the duration of the current processing call, and no two
    /// pointers may alias.
    pub unsafe fn drain_output_buffers<F: Sample>(
        &mut self,
        idx: usize,
        n: usize,
        ppdata: &[*mut F],
        n_frames: usize,
    ) {
        // SAFETY: Forwarded caller contract.
        unsafe { self.router.drain_output_buffers(idx, n, ppdata, n_frames) }
    }

    /// Deliver scratch output into host buffers, summing into the existing
    /// contents (multiple buses aliasing one physical channel). See
    /// [`BufferRouter::drain_output_buffers_accumulating`].
    ///
    /// # Safety
    ///
    /// Same contract as [`drain_output_buffers`](Self::drain_output_buffers).
    pub unsafe fn drain_output_buffers_accumulating<F: Sample>(
        &mut self,
        idx: usize,
        n: usize,
        ppdata: &[*mut F],
        n_frames: usize,
    ) {
        // SAFETY: Forwarded caller contract.
        unsafe {
            self.router
                .drain_output_buffers_accumulating(idx, n, ppdata, n_frames)
        }
    }

    /// Re-zero every engine-owned scratch buffer and the shared silent
    /// buffer.
    pub fn zero_scratch_buffers(&mut self) {
        self.router.zero_scratch_buffers();
    }

    // =========================================================================
    // Processing
    // =========================================================================

    /// Run one block: invokes the user handler, or the latency-compensated
    /// pass-through while bypassed. Attachment must have happened for this
    /// block; `n_frames` must not exceed the configured block size.
    pub fn process_buffers(&mut self, n_frames: usize) {
        debug_assert!(n_frames <= self.router.block_size());
        if self.bypassed {
            self.pass_through_buffers(n_frames);
            return;
        }

        let context = ProcessContext {
            sample_rate: self.sample_rate,
            rendering_offline: self.rendering_offline,
            time_info: &self.time_info,
        };
        // SAFETY: Attachment left every pointer-table entry valid for
        // n_frames samples for the duration of this call.
        let inputs = unsafe { BlockInputs::new(self.router.input_ptrs(), n_frames) };
        // SAFETY: As above; output entries are pairwise non-aliasing (host
        // buffers or distinct scratch).
        let mut outputs = unsafe { BlockOutputs::new(self.router.output_ptrs(), n_frames) };
        self.handler.process_block(&inputs, &mut outputs, &context);
    }

    /// Copy input to output, reproducing the reported latency through the
    /// bypass delay line. With zero latency this is a pure copy; output
    /// slots with no input counterpart are zero-filled.
    pub fn pass_through_buffers(&mut self, n_frames: usize) {
        debug_assert!(n_frames <= self.router.block_size());
        let in_ptrs = self.router.input_ptrs();
        let out_ptrs = self.router.output_ptrs();

        let delayed = match &mut self.latency_delay {
            Some(delay) => {
                // SAFETY: Attachment left every pointer valid for n_frames
                // samples; the delay line tolerates aliased in/out pairs.
                unsafe { delay.process_block(in_ptrs, out_ptrs, n_frames) };
                delay.n_channels().min(in_ptrs.len())
            }
            None => 0,
        };

        for ch in delayed..out_ptrs.len() {
            if self.latency_delay.is_none() && ch < in_ptrs.len() {
                // SAFETY: Attachment guarantees validity for n_frames
                // samples; ptr::copy tolerates in-place (aliased) buffers.
                unsafe { std::ptr::copy(in_ptrs[ch], out_ptrs[ch], n_frames) };
            } else {
                // SAFETY: Output entries are valid for n_frames writes.
                let out = unsafe { std::slice::from_raw_parts_mut(out_ptrs[ch], n_frames) };
                out.fill(S::ZERO);
            }
        }
    }

    /// Hand one MIDI message to the handler, if the plugin does MIDI.
    pub fn process_midi(&mut self, message: MidiMessage) {
        if self.does_midi {
            self.handler.on_midi(&message);
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Host activation/deactivation, called with the channel arrangement
    /// settled and no processing call in flight. Rebuilds the bypass delay
    /// line for the current latency and connected output count.
    pub fn set_active(&mut self, active: bool) {
        self.handler.on_activate(active);
        if active {
            self.rebuild_latency_delay();
        }
    }

    /// Transport reset, called with no processing call in flight. Resets
    /// the handler and rebuilds (clears) the bypass delay line.
    pub fn reset(&mut self) {
        self.handler.on_reset();
        self.rebuild_latency_delay();
    }

    fn rebuild_latency_delay(&mut self) {
        let n_channels = self.router.n_connected(Direction::Output);
        self.latency_delay = if self.latency > 0 && n_channels > 0 {
            debug!(
                "bypass delay: {} channel(s) x {} sample(s)",
                n_channels, self.latency
            );
            Some(NChanDelayLine::new(n_channels, self.latency))
        } else {
            None
        };
    }
}
