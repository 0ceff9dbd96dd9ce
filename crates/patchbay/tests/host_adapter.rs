//! End-to-end tests driving the processing core the way a host adapter
//! would: negotiate an arrangement, run the lifecycle, attach raw buffers
//! block by block, and check what comes out the other side.

use patchbay::prelude::*;

/// Passes audio through unmodified and counts blocks.
struct PassThrough {
    blocks: usize,
}

impl AudioProcessor<f64> for PassThrough {
    fn process_block(
        &mut self,
        inputs: &BlockInputs<'_, f64>,
        outputs: &mut BlockOutputs<'_, f64>,
        _context: &ProcessContext<'_>,
    ) {
        self.blocks += 1;
        for ch in 0..outputs.n_channels() {
            let input = inputs.channel(ch.min(inputs.n_channels().saturating_sub(1)));
            outputs.channel_mut(ch).copy_from_slice(input);
        }
    }
}

/// Writes a constant value to every output channel of every bus.
struct Constant(f64);

impl AudioProcessor<f64> for Constant {
    fn process_block(
        &mut self,
        _inputs: &BlockInputs<'_, f64>,
        outputs: &mut BlockOutputs<'_, f64>,
        _context: &ProcessContext<'_>,
    ) {
        for ch in 0..outputs.n_channels() {
            outputs.channel_mut(ch).fill(self.0);
        }
    }
}

const BLOCK: usize = 64;

fn stereo_processor(latency: usize) -> Processor<f64, PassThrough> {
    let config = ProcessorConfig::new("2-2").with_latency(latency);
    let mut processor = Processor::new(&config, PassThrough { blocks: 0 }).unwrap();
    processor.set_sample_rate(48000.0);
    processor.set_block_size(BLOCK);
    processor.set_input_connections(0, 2, true);
    processor.set_output_connections(0, 2, true);
    processor.set_active(true);
    processor
}

/// Run one block through the processor with host-owned buffers.
fn run_block(
    processor: &mut Processor<f64, PassThrough>,
    input: &[Vec<f64>],
    output: &mut [Vec<f64>],
) {
    let in_ptrs: Vec<*const f64> = input.iter().map(|ch| ch.as_ptr()).collect();
    let out_ptrs: Vec<*mut f64> = output.iter_mut().map(|ch| ch.as_mut_ptr()).collect();
    processor.set_time_info(TimeInfo::default());
    // SAFETY: The channel vectors outlive this call and each holds BLOCK
    // samples; output channels are distinct allocations.
    unsafe {
        processor.attach_input_buffers(0, 2, &in_ptrs, BLOCK);
        processor.attach_output_buffers(0, 2, &out_ptrs);
    }
    processor.process_buffers(BLOCK);
}

#[test]
fn bypass_with_latency_delays_impulse_exactly() {
    let mut processor = stereo_processor(256);
    processor.set_bypassed(true);

    let mut collected = Vec::new();
    let silent = vec![vec![0.0f64; BLOCK]; 2];
    let mut output = vec![vec![0.0f64; BLOCK]; 2];

    // Unit impulse at sample 0 of the left channel, then silence.
    let mut impulse = silent.clone();
    impulse[0][0] = 1.0;
    run_block(&mut processor, &impulse, &mut output);
    collected.extend_from_slice(&output[0]);

    for _ in 0..7 {
        run_block(&mut processor, &silent, &mut output);
        collected.extend_from_slice(&output[0]);
    }

    assert_eq!(collected.len(), 512);
    for (i, &sample) in collected.iter().enumerate() {
        let expected = if i == 256 { 1.0 } else { 0.0 };
        assert_eq!(sample, expected, "output sample {i}");
    }
    // The user handler never ran while bypassed.
    assert_eq!(processor.handler().blocks, 0);
}

#[test]
fn zero_latency_bypass_is_sample_exact() {
    let mut processor = stereo_processor(0);
    processor.set_bypassed(true);

    let input: Vec<Vec<f64>> = (0..2)
        .map(|ch| (0..BLOCK).map(|i| (i as f64) + ch as f64 * 1000.0).collect())
        .collect();
    let mut output = vec![vec![9.0f64; BLOCK]; 2];
    run_block(&mut processor, &input, &mut output);

    assert_eq!(output, input);
}

#[test]
fn unbypassing_resumes_the_handler() {
    let mut processor = stereo_processor(0);
    let input = vec![vec![0.25f64; BLOCK]; 2];
    let mut output = vec![vec![0.0f64; BLOCK]; 2];

    processor.set_bypassed(true);
    run_block(&mut processor, &input, &mut output);
    assert_eq!(processor.handler().blocks, 0);

    processor.set_bypassed(false);
    run_block(&mut processor, &input, &mut output);
    assert_eq!(processor.handler().blocks, 1);
    assert_eq!(output[1], input[1]);
}

#[test]
fn missing_host_channels_read_as_silence() {
    let config = ProcessorConfig::new("2-2");
    let mut processor = Processor::new(&config, PassThrough { blocks: 0 }).unwrap();
    processor.set_block_size(BLOCK);
    // Host negotiated only one of the two declared channels.
    processor.set_input_connections(0, 1, true);
    processor.set_input_connections(1, 1, false);
    processor.set_output_connections(0, 2, true);

    let left = vec![0.5f64; BLOCK];
    let in_ptrs = [left.as_ptr()];
    let mut out_l = vec![9.0f64; BLOCK];
    let mut out_r = vec![9.0f64; BLOCK];
    let out_ptrs = [out_l.as_mut_ptr(), out_r.as_mut_ptr()];
    // SAFETY: All channel vectors outlive the call and hold BLOCK samples.
    unsafe {
        processor.attach_input_buffers(0, 2, &in_ptrs, BLOCK);
        processor.attach_output_buffers(0, 2, &out_ptrs);
    }
    processor.process_buffers(BLOCK);

    assert_eq!(out_l, left);
    // Channel 1 was unconnected: the handler saw exact silence.
    assert_eq!(out_r, vec![0.0; BLOCK]);
}

#[test]
fn foreign_precision_host_round_trip() {
    // Engine runs f64 internally; the host supplies f32 buffers both ways.
    let config = ProcessorConfig::new("1-1");
    let mut processor = Processor::new(&config, PassThrough { blocks: 0 }).unwrap();
    processor.set_block_size(BLOCK);
    processor.set_input_connections(0, 1, true);
    processor.set_output_connections(0, 1, true);

    let host_in: Vec<f32> = (0..BLOCK).map(|i| i as f32 / BLOCK as f32).collect();
    let mut host_out = vec![0.0f32; BLOCK];
    let in_ptrs = [host_in.as_ptr()];
    let out_ptrs = [host_out.as_mut_ptr()];
    // SAFETY: Host vectors outlive the calls and hold BLOCK samples.
    unsafe {
        processor.attach_input_buffers_converting(0, 1, &in_ptrs, BLOCK);
    }
    processor.attach_output_scratch(0, 1);
    processor.process_buffers(BLOCK);
    // SAFETY: As above.
    unsafe {
        processor.drain_output_buffers(0, 1, &out_ptrs, BLOCK);
    }

    assert_eq!(host_out, host_in);
}

#[test]
fn bus_summing_accumulates_into_host_channels() {
    // Four stereo output buses, summed onto one physical stereo pair.
    let config = ProcessorConfig::new("0-2.2.2.2").as_instrument();
    let mut processor = Processor::new(&config, Constant(0.25)).unwrap();
    assert!(processor.is_instrument());
    processor.set_block_size(BLOCK);
    processor.set_output_connections(0, 8, true);
    processor.zero_scratch_buffers();
    processor.attach_output_scratch(0, 8);
    processor.process_buffers(BLOCK);

    let mut host_l = vec![0.0f64; BLOCK];
    let mut host_r = vec![0.0f64; BLOCK];
    let out_ptrs = [host_l.as_mut_ptr(), host_r.as_mut_ptr()];
    // First bus overwrites, the remaining three accumulate.
    // SAFETY: Host vectors outlive the calls and hold BLOCK samples.
    unsafe {
        processor.drain_output_buffers(0, 2, &out_ptrs, BLOCK);
        for bus in 1..4 {
            processor.drain_output_buffers_accumulating(bus * 2, 2, &out_ptrs, BLOCK);
        }
    }

    assert_eq!(host_l, vec![1.0; BLOCK]);
    assert_eq!(host_r, vec![1.0; BLOCK]);
}

#[test]
fn legality_gates_activation() {
    let config = ProcessorConfig::new("1-1 2-2");
    let processor = Processor::new(&config, PassThrough { blocks: 0 }).unwrap();

    assert!(processor.legal_io(Some(2), Some(2)));
    assert!(processor.legal_io(Some(1), Some(1)));
    assert!(!processor.legal_io(Some(2), Some(1)));
    assert!(!processor.legal_io(Some(3), Some(3)));
}

#[test]
fn construction_fails_on_authoring_defects() {
    let bad = [
        "",
        "11",
        "1-1 2-b",
        "*.*-2",
        "2-*.*",
    ];
    for io_str in bad {
        let config = ProcessorConfig::new(io_str);
        assert!(
            Processor::new(&config, PassThrough { blocks: 0 }).is_err(),
            "expected {io_str:?} to fail"
        );
    }
}
