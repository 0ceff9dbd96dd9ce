//! Worst-case sizing of the per-instance channel-descriptor arrays.
//!
//! A processor may declare several alternative channel I/O configs, and the
//! host picks one at activation. Descriptor arrays are sized once, at
//! construction, to the worst case across every config so that any legal
//! runtime arrangement fits without reallocation.

use crate::channel_io::ChannelIo;
use crate::types::Direction;

/// Derived per-instance sizing: max buses per direction and, for each bus
/// position, the max channel count observed across the configs defining it.
///
/// Built once from the parsed [`ChannelIo`]; only rebuilt if the
/// configuration string itself changes, which is not expected at runtime.
#[derive(Clone, Debug)]
pub struct Topology {
    in_bus_channels: Vec<usize>,
    out_bus_channels: Vec<usize>,
}

impl Topology {
    /// Compute worst-case sizing from a parsed channel I/O declaration.
    pub fn from_channel_io(io: &ChannelIo) -> Self {
        let sizes = |direction: Direction| {
            let mut per_bus = vec![0usize; io.max_buses(direction)];
            for config in io.configs() {
                for (bus, size) in per_bus.iter_mut().enumerate() {
                    *size = (*size).max(config.channels_on_bus(direction, bus));
                }
            }
            per_bus
        };

        Self {
            in_bus_channels: sizes(Direction::Input),
            out_bus_channels: sizes(Direction::Output),
        }
    }

    fn bus_channels(&self, direction: Direction) -> &[usize] {
        match direction {
            Direction::Input => &self.in_bus_channels,
            Direction::Output => &self.out_bus_channels,
        }
    }

    /// Max bus count for one direction.
    pub fn max_buses(&self, direction: Direction) -> usize {
        self.bus_channels(direction).len()
    }

    /// Max channel count for a given bus position, or 0 if no config defines
    /// that position.
    pub fn max_channels_for_bus(&self, direction: Direction, bus: usize) -> usize {
        self.bus_channels(direction).get(bus).copied().unwrap_or(0)
    }

    /// Total descriptor-array length for one direction: channel slots summed
    /// over all bus positions.
    pub fn n_channels(&self, direction: Direction) -> usize {
        self.bus_channels(direction).iter().sum()
    }

    /// Map a flat channel-slot index back to its (bus, index-within-bus)
    /// position. Returns `None` past the end of the descriptor array.
    pub fn bus_for_channel(&self, direction: Direction, channel: usize) -> Option<(usize, usize)> {
        let mut remaining = channel;
        for (bus, &n) in self.bus_channels(direction).iter().enumerate() {
            if remaining < n {
                return Some((bus, remaining));
            }
            remaining -= n;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MAX_CHANNELS;

    fn topology(io_str: &str) -> Topology {
        Topology::from_channel_io(&ChannelIo::parse(io_str).unwrap())
    }

    #[test]
    fn test_single_config_sizing() {
        let t = topology("1.1-1");
        assert_eq!(t.max_buses(Direction::Input), 2);
        assert_eq!(t.max_buses(Direction::Output), 1);
        assert_eq!(t.n_channels(Direction::Input), 2);
        assert_eq!(t.n_channels(Direction::Output), 1);
    }

    #[test]
    fn test_worst_case_across_configs() {
        // Bus 0 worst case is 2 channels, bus 1 only exists in the sidechain
        // config with 1 channel.
        let t = topology("1-1 2-2 2.1-2");
        assert_eq!(t.max_buses(Direction::Input), 2);
        assert_eq!(t.max_channels_for_bus(Direction::Input, 0), 2);
        assert_eq!(t.max_channels_for_bus(Direction::Input, 1), 1);
        assert_eq!(t.n_channels(Direction::Input), 3);
        assert_eq!(t.n_channels(Direction::Output), 2);
    }

    #[test]
    fn test_out_of_range_is_zero_sentinel() {
        let t = topology("1-1");
        assert_eq!(t.max_channels_for_bus(Direction::Input, 5), 0);
        assert_eq!(t.max_channels_for_bus(Direction::Output, 1), 0);
    }

    #[test]
    fn test_wildcard_bus_sized_to_upper_bound() {
        let t = topology("*-2");
        assert_eq!(t.max_channels_for_bus(Direction::Input, 0), MAX_CHANNELS);
        assert_eq!(t.n_channels(Direction::Input), MAX_CHANNELS);
    }

    #[test]
    fn test_bus_for_channel() {
        let t = topology("0-2.2.2.2");
        assert_eq!(t.bus_for_channel(Direction::Output, 0), Some((0, 0)));
        assert_eq!(t.bus_for_channel(Direction::Output, 1), Some((0, 1)));
        assert_eq!(t.bus_for_channel(Direction::Output, 2), Some((1, 0)));
        assert_eq!(t.bus_for_channel(Direction::Output, 7), Some((3, 1)));
        assert_eq!(t.bus_for_channel(Direction::Output, 8), None);
        assert_eq!(t.bus_for_channel(Direction::Input, 0), None);
    }
}
