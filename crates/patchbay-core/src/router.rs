//! Per-block attachment of host buffers into a stable scratch layout.
//!
//! The router owns one channel descriptor per declared channel slot and two
//! flat pointer tables (one per direction) that user processing code sees
//! through the [`BlockInputs`](crate::buffer::BlockInputs) and
//! [`BlockOutputs`](crate::buffer::BlockOutputs) views. Each processing
//! block the host adapter attaches its raw buffers into these tables.
//!
//! The central guarantee: after attachment, **every** declared input slot
//! points at a valid buffer of at least `n_frames` samples. Slots the host
//! did not supply (unconnected, or beyond the negotiated count) point at a
//! shared pre-zeroed silent buffer; absent output slots point at their own
//! per-channel scratch so stray writes land somewhere harmless. User code
//! never sees a null or stale pointer.
//!
//! # Real-Time Safety
//!
//! - All buffers are sized in [`BufferRouter::set_block_size`] (non-real-time)
//! - Attachment writes pointers and, at most, converts samples into
//!   pre-sized scratch; it never allocates, locks, or performs I/O
//! - Attached pointers are transient: overwritten every block, never owning

use crate::sample::{accumulate_slice, convert_slice, Sample};
use crate::topology::Topology;
use crate::types::Direction;
use std::slice;

/// Descriptor for one physical channel slot.
///
/// The array of descriptors is fixed for the instance lifetime; only the
/// label (pre-finalization), the connected flag (host negotiation) and the
/// scratch contents change.
#[derive(Clone, Debug)]
pub struct ChannelData<S: Sample> {
    bus: usize,
    index: usize,
    label: String,
    connected: bool,
    scratch: Vec<S>,
}

impl<S: Sample> ChannelData<S> {
    fn new(bus: usize, index: usize, label: String) -> Self {
        Self {
            bus,
            index,
            label,
            connected: false,
            scratch: Vec::new(),
        }
    }

    /// Index of the bus this slot belongs to.
    pub fn bus(&self) -> usize {
        self.bus
    }

    /// Position of this slot within its bus.
    pub fn index_in_bus(&self) -> usize {
        self.index
    }

    /// Human-readable channel label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the host has connected this channel.
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Routes host-owned raw buffers into the declared channel slots each block.
pub struct BufferRouter<S: Sample> {
    in_channels: Vec<ChannelData<S>>,
    out_channels: Vec<ChannelData<S>>,
    /// Transient input pointer table; every entry is overwritten by
    /// attachment and valid only for the current processing call.
    in_data: Vec<*const S>,
    /// Transient output pointer table, mirroring `in_data`.
    out_data: Vec<*mut S>,
    /// Shared all-zero buffer backing every absent input slot.
    silent: Vec<S>,
    block_size: usize,
}

// SAFETY: The raw pointer tables are only dereferenced inside a single
// processing call, during which the host guarantees exclusive access to the
// instance and to the buffers the pointers name. Between calls the tables
// hold either stale host pointers (never dereferenced) or pointers into the
// router's own heap buffers, which move with it.
unsafe impl<S: Sample> Send for BufferRouter<S> {}
// SAFETY: Shared references to the router only expose descriptor metadata,
// never dereference the pointer tables.
unsafe impl<S: Sample> Sync for BufferRouter<S> {}

impl<S: Sample> BufferRouter<S> {
    /// Build descriptor arrays for the worst-case topology.
    ///
    /// Labels default to the synthesized "input N" / "output N" form.
    /// Buffers are empty until the first [`set_block_size`](Self::set_block_size).
    pub fn new(topology: &Topology) -> Self {
        let build = |direction: Direction| {
            let n = topology.n_channels(direction);
            (0..n)
                .map(|ch| {
                    // Sizing guarantees every slot maps to a bus position.
                    let (bus, index) = topology
                        .bus_for_channel(direction, ch)
                        .unwrap_or((0, ch));
                    let label = format!("{} {}", direction.label_stem(), ch + 1);
                    ChannelData::new(bus, index, label)
                })
                .collect::<Vec<_>>()
        };

        let in_channels = build(Direction::Input);
        let out_channels = build(Direction::Output);
        let n_in = in_channels.len();
        let n_out = out_channels.len();

        let mut router = Self {
            in_channels,
            out_channels,
            in_data: vec![std::ptr::null(); n_in],
            out_data: vec![std::ptr::null_mut(); n_out],
            silent: Vec::new(),
            block_size: 0,
        };
        router.reset_pointers();
        router
    }

    /// Current block size the scratch layout is sized for.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of declared channel slots for one direction.
    pub fn n_channels(&self, direction: Direction) -> usize {
        self.channels(direction).len()
    }

    fn channels(&self, direction: Direction) -> &[ChannelData<S>] {
        match direction {
            Direction::Input => &self.in_channels,
            Direction::Output => &self.out_channels,
        }
    }

    fn channels_mut(&mut self, direction: Direction) -> &mut [ChannelData<S>] {
        match direction {
            Direction::Input => &mut self.in_channels,
            Direction::Output => &mut self.out_channels,
        }
    }

    /// Descriptor for one channel slot, if it exists.
    pub fn channel(&self, direction: Direction, idx: usize) -> Option<&ChannelData<S>> {
        self.channels(direction).get(idx)
    }

    /// Whether the host has connected a channel. Out-of-range queries are
    /// simply not connected.
    pub fn is_connected(&self, direction: Direction, idx: usize) -> bool {
        self.channels(direction)
            .get(idx)
            .map(|c| c.connected)
            .unwrap_or(false)
    }

    /// Number of connected channels for one direction.
    ///
    /// Assumes connected channels are contiguous from index 0. That matches
    /// how hosts negotiate arrangements today; a sparse connection pattern
    /// would be undercounted.
    pub fn n_connected(&self, direction: Direction) -> usize {
        self.channels(direction)
            .iter()
            .take_while(|c| c.connected)
            .count()
    }

    /// Override a channel label. Intended for use before the topology is
    /// handed to the host (e.g. "W"/"X"/"Y"/"Z" for ambisonic material).
    pub fn set_label(&mut self, direction: Direction, idx: usize, label: &str) {
        if let Some(channel) = self.channels_mut(direction).get_mut(idx) {
            channel.label = label.to_string();
        }
    }

    /// A channel's label, if the slot exists.
    pub fn label(&self, direction: Direction, idx: usize) -> Option<&str> {
        self.channels(direction).get(idx).map(|c| c.label.as_str())
    }

    /// Resize every engine-owned buffer for a new block length and re-zero.
    ///
    /// The only place scratch and silent buffers are (re)allocated. Must not
    /// be called concurrently with a processing call; the host's lifecycle
    /// contract provides that exclusion.
    pub fn set_block_size(&mut self, block_size: usize) {
        self.block_size = block_size;
        self.silent.clear();
        self.silent.resize(block_size, S::ZERO);
        for channel in self.in_channels.iter_mut().chain(self.out_channels.iter_mut()) {
            channel.scratch.clear();
            channel.scratch.resize(block_size, S::ZERO);
        }
        self.reset_pointers();
    }

    /// Re-zero every engine-owned scratch buffer and the shared silent
    /// buffer. Establishes the silence guarantee and prepares for
    /// bus-accumulating writes.
    pub fn zero_scratch_buffers(&mut self) {
        self.silent.fill(S::ZERO);
        for channel in self.in_channels.iter_mut().chain(self.out_channels.iter_mut()) {
            channel.scratch.fill(S::ZERO);
        }
    }

    /// Point every slot back at engine-owned memory: silence for inputs,
    /// per-channel scratch for outputs.
    fn reset_pointers(&mut self) {
        let silent = self.silent.as_ptr();
        for ptr in self.in_data.iter_mut() {
            *ptr = silent;
        }
        for (ptr, channel) in self.out_data.iter_mut().zip(self.out_channels.iter_mut()) {
            *ptr = channel.scratch.as_mut_ptr();
        }
    }

    /// Mark a range of input slots as connected or not. Unconnected slots
    /// are pointed at silence immediately.
    pub fn set_input_channel_connections(&mut self, idx: usize, n: usize, connected: bool) {
        let end = (idx + n).min(self.in_channels.len());
        let silent = self.silent.as_ptr();
        for ch in idx..end {
            self.in_channels[ch].connected = connected;
            if !connected {
                self.in_data[ch] = silent;
            }
        }
    }

    /// Mark a range of output slots as connected or not. Unconnected slots
    /// are pointed at their own scratch immediately.
    pub fn set_output_channel_connections(&mut self, idx: usize, n: usize, connected: bool) {
        let end = (idx + n).min(self.out_channels.len());
        for ch in idx..end {
            self.out_channels[ch].connected = connected;
            if !connected {
                self.out_data[ch] = self.out_channels[ch].scratch.as_mut_ptr();
            }
        }
    }

    /// Attach host input buffers, native precision.
    ///
    /// Covers slots `idx..idx + n`. Pointers in `ppdata` are consumed in
    /// order by the connected slots in that range; a connected slot with no
    /// pointer left (or a null one), and every unconnected slot, falls back
    /// to the shared silent buffer.
    ///
    /// # Safety
    ///
    /// Every non-null pointer in `ppdata` must be valid for `n_frames` reads
    /// for the duration of the current processing call.
    pub unsafe fn attach_input_buffers(
        &mut self,
        idx: usize,
        n: usize,
        ppdata: &[*const S],
        n_frames: usize,
    ) {
        debug_assert!(n_frames <= self.block_size);
        let end = (idx + n).min(self.in_channels.len());
        let silent = self.silent.as_ptr();
        let mut supplied = ppdata.iter();
        for ch in idx..end {
            self.in_data[ch] = if self.in_channels[ch].connected {
                match supplied.next() {
                    Some(&ptr) if !ptr.is_null() => ptr,
                    _ => silent,
                }
            } else {
                silent
            };
        }
    }

    /// Attach host input buffers of a foreign sample type, converting into
    /// the pre-sized per-channel scratch buffers.
    ///
    /// Fallback rules match [`attach_input_buffers`](Self::attach_input_buffers).
    ///
    /// # Safety
    ///
    /// Every non-null pointer in `ppdata` must be valid for `n_frames` reads
    /// for the duration of the current processing call.
    pub unsafe fn attach_input_buffers_converting<F: Sample>(
        &mut self,
        idx: usize,
        n: usize,
        ppdata: &[*const F],
        n_frames: usize,
    ) {
        debug_assert!(n_frames <= self.block_size);
        let end = (idx + n).min(self.in_channels.len());
        let silent = self.silent.as_ptr();
        let mut supplied = ppdata.iter();
        for ch in idx..end {
            let channel = &mut self.in_channels[ch];
            if !channel.connected {
                self.in_data[ch] = silent;
                continue;
            }
            self.in_data[ch] = match supplied.next() {
                Some(&ptr) if !ptr.is_null() => {
                    // SAFETY: Caller guarantees ptr is valid for n_frames
                    // reads during this call.
                    let src = unsafe { slice::from_raw_parts(ptr, n_frames) };
                    convert_slice(src, &mut channel.scratch[..n_frames]);
                    channel.scratch.as_ptr()
                }
                _ => silent,
            };
        }
    }

    /// Attach host output buffers, native precision. The engine writes
    /// straight into host memory; unconnected or unsupplied slots write
    /// into their own scratch.
    ///
    /// # Safety
    ///
    /// Every non-null pointer in `ppdata` must be valid for writes of one
    /// full block for the duration of the current processing call, and no
    /// two pointers may alias the same buffer.
    pub unsafe fn attach_output_buffers(&mut self, idx: usize, n: usize, ppdata: &[*mut S]) {
        let end = (idx + n).min(self.out_channels.len());
        let mut supplied = ppdata.iter();
        for ch in idx..end {
            self.out_data[ch] = if self.out_channels[ch].connected {
                match supplied.next() {
                    Some(&ptr) if !ptr.is_null() => ptr,
                    _ => self.out_channels[ch].scratch.as_mut_ptr(),
                }
            } else {
                self.out_channels[ch].scratch.as_mut_ptr()
            };
        }
    }

    /// Point a range of output slots at their scratch buffers, for hosts
    /// whose sample type differs from the engine's. The engine writes
    /// scratch; a drain call then delivers it.
    pub fn attach_output_scratch(&mut self, idx: usize, n: usize) {
        let end = (idx + n).min(self.out_channels.len());
        for ch in idx..end {
            self.out_data[ch] = self.out_channels[ch].scratch.as_mut_ptr();
        }
    }

    /// Convert scratch contents into host output buffers, overwriting.
    ///
    /// Pointers in `ppdata` are consumed in order by the connected slots in
    /// the range, mirroring attachment. Unconnected slots deliver nothing.
    ///
    /// # Safety
    ///
    /// Every non-null pointer in `ppdata` must be valid for `n_frames`
    /// writes for the duration of the current processing call, and no two
    /// pointers may alias the same buffer.
    pub unsafe fn drain_output_buffers<F: Sample>(
        &mut self,
        idx: usize,
        n: usize,
        ppdata: &[*mut F],
        n_frames: usize,
    ) {
        // SAFETY: Forwarded caller contract.
        unsafe { self.drain_outputs(idx, n, ppdata, n_frames, false) }
    }

    /// Convert scratch contents into host output buffers, adding into the
    /// existing contents. Used when multiple output buses sum onto the same
    /// physical host channel.
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
        unsafe { self.drain_outputs(idx, n, ppdata, n_frames, true) }
    }

    unsafe fn drain_outputs<F: Sample>(
        &mut self,
        idx: usize,
        n: usize,
        ppdata: &[*mut F],
        n_frames: usize,
        accumulate: bool,
    ) {
        debug_assert!(n_frames <= self.block_size);
        let end = (idx + n).min(self.out_channels.len());
        let mut supplied = ppdata.iter();
        for ch in idx..end {
            let channel = &self.out_channels[ch];
            if !channel.connected {
                continue;
            }
            let Some(&ptr) = supplied.next() else { break };
            if ptr.is_null() {
                continue;
            }
            // SAFETY: Caller guarantees ptr is valid for n_frames writes
            // during this call and does not alias other supplied buffers.
            let dst = unsafe { slice::from_raw_parts_mut(ptr, n_frames) };
            if accumulate {
                accumulate_slice(&channel.scratch[..n_frames], dst);
            } else {
                convert_slice(&channel.scratch[..n_frames], dst);
            }
        }
    }

    /// The transient input pointer table for the current block.
    pub(crate) fn input_ptrs(&self) -> &[*const S] {
        &self.in_data
    }

    /// The transient output pointer table for the current block.
    pub(crate) fn output_ptrs(&self) -> &[*mut S] {
        &self.out_data
    }
}
