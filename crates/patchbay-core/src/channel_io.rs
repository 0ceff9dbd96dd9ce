//! Channel I/O configuration grammar and the parsed bus topology model.
//!
//! A processor declares every channel arrangement it supports with a compact
//! string, parsed once at construction:
//!
//! ```text
//! "1-1"        mono in, mono out
//! "1.1-1"      mono in plus mono sidechain, mono out
//! "0-2.2.2.2"  no input, four stereo output buses (e.g. a drum machine)
//! "2-2 1-1"    two alternative configs, tried in order
//! "*-*"        wildcard: any channel count negotiated at runtime
//! ```
//!
//! Configs are separated by whitespace; the `-` splits the input side from
//! the output side; `.` separates buses within a side; a bus token is a
//! non-negative integer or the `*` wildcard. At most one wildcard bus is
//! allowed per direction per config.

use crate::error::ChannelIoError;
use crate::types::{Direction, MAX_BUSES, MAX_CHANNELS};

/// Wildcard bus token in the channel I/O grammar.
const WILDCARD: &str = "*";

/// Channel count declared for one bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusChannels {
    /// Exactly this many channels.
    Fixed(u32),
    /// Any channel count, negotiated with the host at runtime.
    Wildcard,
}

impl BusChannels {
    /// Whether a runtime channel count satisfies this declaration.
    pub fn matches(&self, n_channels: usize) -> bool {
        match self {
            BusChannels::Fixed(n) => *n as usize == n_channels,
            BusChannels::Wildcard => true,
        }
    }

    /// Channel count used when sizing descriptor arrays.
    ///
    /// A wildcard bus is sized to [`MAX_CHANNELS`] so any negotiated
    /// arrangement fits without reallocation.
    pub fn upper_bound(&self) -> usize {
        match self {
            BusChannels::Fixed(n) => *n as usize,
            BusChannels::Wildcard => MAX_CHANNELS,
        }
    }

    /// Whether this is the wildcard marker.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, BusChannels::Wildcard)
    }
}

/// One bus within an [`IoConfig`]: a channel-count declaration plus a label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusInfo {
    channels: BusChannels,
    label: String,
}

impl BusInfo {
    /// Create a bus declaration.
    pub fn new(channels: BusChannels, label: impl Into<String>) -> Self {
        Self {
            channels,
            label: label.into(),
        }
    }

    /// The declared channel count.
    pub fn channels(&self) -> BusChannels {
        self.channels
    }

    /// The bus label (defaults to "input"/"output" when parsed).
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// One valid combination of input-bus and output-bus channel counts.
///
/// Immutable once parsed. Totals are computed at construction and cached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IoConfig {
    input_buses: Vec<BusInfo>,
    output_buses: Vec<BusInfo>,
    total_in: usize,
    total_out: usize,
}

impl IoConfig {
    fn new(input_buses: Vec<BusInfo>, output_buses: Vec<BusInfo>) -> Self {
        let total = |buses: &[BusInfo]| {
            buses.iter().map(|b| b.channels.upper_bound()).sum()
        };
        let total_in = total(&input_buses);
        let total_out = total(&output_buses);
        Self {
            input_buses,
            output_buses,
            total_in,
            total_out,
        }
    }

    /// The buses declared for one direction, in declaration order.
    pub fn buses(&self, direction: Direction) -> &[BusInfo] {
        match direction {
            Direction::Input => &self.input_buses,
            Direction::Output => &self.output_buses,
        }
    }

    /// Number of buses declared for one direction.
    pub fn n_buses(&self, direction: Direction) -> usize {
        self.buses(direction).len()
    }

    /// Channel count declared at a bus position, or 0 if the position does
    /// not exist. Introspection must not be able to crash the host, so
    /// out-of-range lookups return the zero sentinel rather than failing.
    pub fn channels_on_bus(&self, direction: Direction, bus: usize) -> usize {
        self.buses(direction)
            .get(bus)
            .map(|b| b.channels.upper_bound())
            .unwrap_or(0)
    }

    /// Bus declaration at an index, if it exists.
    pub fn bus(&self, direction: Direction, bus: usize) -> Option<&BusInfo> {
        self.buses(direction).get(bus)
    }

    /// Total channel count across all buses in one direction.
    ///
    /// Wildcard buses count at their sizing upper bound.
    pub fn total_channels(&self, direction: Direction) -> usize {
        match direction {
            Direction::Input => self.total_in,
            Direction::Output => self.total_out,
        }
    }

    /// Whether any bus in one direction is a wildcard.
    pub fn has_wildcard(&self, direction: Direction) -> bool {
        self.buses(direction).iter().any(|b| b.channels.is_wildcard())
    }

    /// Whether this config accepts a candidate channel-count pair.
    ///
    /// `None` on either side means "don't care". A constrained side matches
    /// if its total equals the request exactly, or if a wildcard bus makes
    /// any total acceptable.
    pub fn matches(&self, n_inputs: Option<usize>, n_outputs: Option<usize>) -> bool {
        let side = |direction: Direction, requested: Option<usize>| match requested {
            None => true,
            Some(n) => {
                self.has_wildcard(direction) || self.total_channels(direction) == n
            }
        };
        side(Direction::Input, n_inputs) && side(Direction::Output, n_outputs)
    }
}

/// The full parsed channel I/O declaration: an ordered config list plus the
/// running aggregates used to size per-instance descriptor arrays.
#[derive(Clone, Debug)]
pub struct ChannelIo {
    configs: Vec<IoConfig>,
    max_in_channels: usize,
    max_out_channels: usize,
    max_in_buses: usize,
    max_out_buses: usize,
}

impl ChannelIo {
    /// Parse a channel I/O configuration string.
    ///
    /// Any malformed token fails the whole parse; this is a construction-time
    /// authoring defect, not a recoverable runtime condition.
    pub fn parse(io_str: &str) -> Result<Self, ChannelIoError> {
        let mut configs = Vec::new();

        for config_str in io_str.split_whitespace() {
            let (in_str, out_str) = config_str.split_once('-').ok_or_else(|| {
                ChannelIoError::MissingSeparator {
                    config: config_str.to_string(),
                }
            })?;

            let input_buses = parse_side(config_str, in_str, Direction::Input)?;
            let output_buses = parse_side(config_str, out_str, Direction::Output)?;
            configs.push(IoConfig::new(input_buses, output_buses));
        }

        if configs.is_empty() {
            return Err(ChannelIoError::Empty);
        }

        let running_max = |f: fn(&IoConfig, Direction) -> usize, direction| {
            configs.iter().map(|c| f(c, direction)).max().unwrap_or(0)
        };

        Ok(Self {
            max_in_channels: running_max(IoConfig::total_channels, Direction::Input),
            max_out_channels: running_max(IoConfig::total_channels, Direction::Output),
            max_in_buses: running_max(IoConfig::n_buses, Direction::Input),
            max_out_buses: running_max(IoConfig::n_buses, Direction::Output),
            configs,
        })
    }

    /// Number of configs parsed from the string.
    pub fn n_configs(&self) -> usize {
        self.configs.len()
    }

    /// The config at an index, if it exists.
    pub fn config(&self, idx: usize) -> Option<&IoConfig> {
        self.configs.get(idx)
    }

    /// All parsed configs, in declaration order.
    pub fn configs(&self) -> &[IoConfig] {
        &self.configs
    }

    /// Max bus count for one direction across all configs.
    pub fn max_buses(&self, direction: Direction) -> usize {
        match direction {
            Direction::Input => self.max_in_buses,
            Direction::Output => self.max_out_buses,
        }
    }

    /// Max total channel count for one direction across all configs.
    pub fn max_channels(&self, direction: Direction) -> usize {
        match direction {
            Direction::Input => self.max_in_channels,
            Direction::Output => self.max_out_channels,
        }
    }

    /// Whether any config declares a wildcard bus in one direction.
    pub fn has_wildcard_bus(&self, direction: Direction) -> bool {
        self.configs.iter().any(|c| c.has_wildcard(direction))
    }

    /// Check whether a candidate channel-count pair is legal.
    ///
    /// `None` on either side means "don't care". Configs are tested in parse
    /// order; the first match decides. Hosts use this to validate a channel
    /// arrangement before activation.
    pub fn legal_io(&self, n_inputs: Option<usize>, n_outputs: Option<usize>) -> bool {
        self.configs.iter().any(|c| c.matches(n_inputs, n_outputs))
    }
}

fn parse_side(
    config_str: &str,
    side_str: &str,
    direction: Direction,
) -> Result<Vec<BusInfo>, ChannelIoError> {
    let mut buses = Vec::new();
    let mut seen_wildcard = false;

    for token in side_str.split('.') {
        let channels = if token == WILDCARD {
            if seen_wildcard {
                return Err(ChannelIoError::MultipleWildcards {
                    config: config_str.to_string(),
                    direction,
                });
            }
            seen_wildcard = true;
            BusChannels::Wildcard
        } else {
            let n = token.parse::<u32>().map_err(|_| {
                ChannelIoError::InvalidChannelCount {
                    config: config_str.to_string(),
                    token: token.to_string(),
                }
            })?;
            if n as usize > MAX_CHANNELS {
                return Err(ChannelIoError::BusTooWide {
                    config: config_str.to_string(),
                    token: token.to_string(),
                });
            }
            BusChannels::Fixed(n)
        };
        buses.push(BusInfo::new(channels, direction.label_stem()));
    }

    if buses.len() > MAX_BUSES {
        return Err(ChannelIoError::TooManyBuses {
            config: config_str.to_string(),
            direction,
        });
    }

    Ok(buses)
}
