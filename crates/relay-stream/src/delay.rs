//! Delay policy — simulated per-class processing cost.
//!
//! Delays:
//!   Control — fixed 10 ms (negligible control-plane cost)
//!   Payload — uniform 50–150 ms inclusive, drawn per packet
//!
//! The policy stands in for real content processing: substituting a real
//! processing step later means replacing the sampled wait behind
//! `classify`, not the stream loop around it.

use std::time::Duration;

use rand::Rng;

use relay_core::config::ProcessingConfig;
use relay_core::PacketClass;

/// Distribution a packet's processing delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelaySpec {
    Fixed(Duration),
    /// Uniform over the inclusive range [min, max].
    Uniform(Duration, Duration),
}

impl DelaySpec {
    /// Draw one delay. Draws are independent across calls.
    pub fn sample(&self) -> Duration {
        match *self {
            DelaySpec::Fixed(d) => d,
            DelaySpec::Uniform(min, max) => rand::thread_rng().gen_range(min..=max),
        }
    }
}

/// Maps a packet class to its delay distribution.
#[derive(Debug, Clone)]
pub struct DelayPolicy {
    control: Duration,
    payload_min: Duration,
    payload_max: Duration,
}

impl DelayPolicy {
    /// Invariant: `payload_min <= payload_max`. Config validation enforces
    /// this before a policy is built from user input.
    pub fn new(control: Duration, payload_min: Duration, payload_max: Duration) -> Self {
        debug_assert!(payload_min <= payload_max);
        Self {
            control,
            payload_min,
            payload_max,
        }
    }

    pub fn from_config(settings: &ProcessingConfig) -> Self {
        Self::new(
            settings.control_delay(),
            settings.payload_delay_min(),
            settings.payload_delay_max(),
        )
    }

    /// The distribution for a class. Keyed on class identity only.
    pub fn classify(&self, class: PacketClass) -> DelaySpec {
        match class {
            PacketClass::Control => DelaySpec::Fixed(self.control),
            PacketClass::Payload => DelaySpec::Uniform(self.payload_min, self.payload_max),
        }
    }

    /// Draw the processing delay for one packet.
    pub fn delay_for(&self, class: PacketClass) -> Duration {
        self.classify(class).sample()
    }
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self::from_config(&ProcessingConfig::default())
    }
}
