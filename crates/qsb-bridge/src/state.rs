//! Run options and per-shot results.

use serde::{Deserialize, Serialize};

use qsb_eval::{Receiver, StateDump, format_state_id};
use qsb_ir::Noise;

/// Options for a simulated run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOptions {
    /// Number of shots.
    pub shots: u32,
    /// Noise applied by the simulator.
    pub noise: Noise,
    /// Seed for the random stream shared by all shots.
    pub seed: Option<u64>,
}

impl ExecutionOptions {
    /// Options with an explicit shot count and noise.
    pub fn new(shots: u32, noise: Noise) -> Self {
        Self {
            shots,
            noise,
            seed: None,
        }
    }

    /// Noiseless options with `shots` shots.
    pub fn from_shots(shots: u32) -> Self {
        Self {
            shots,
            ..Default::default()
        }
    }

    /// A single noisy shot.
    pub fn from_noise(noise: Noise) -> Self {
        Self {
            noise,
            ..Default::default()
        }
    }

    /// Fix the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            shots: 1,
            noise: Noise::Ideal,
            seed: None,
        }
    }
}

/// One basis state from a `DumpMachine` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QubitState {
    /// Basis label such as `|01⟩`, qubit 0 leftmost.
    pub id: String,
    pub amplitude_real: f64,
    pub amplitude_imaginary: f64,
}

/// Everything one shot produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionState {
    /// States from the last `DumpMachine` call.
    pub states: Vec<QubitState>,
    /// Qubit count at the last `DumpMachine` call.
    pub qubit_count: u64,
    /// `Message` output in emission order.
    pub messages: Vec<String>,
    /// The entry point's return value, formatted.
    pub result: Option<String>,
}

impl ExecutionState {
    pub(crate) fn set_result(&mut self, result: String) {
        self.result = Some(result);
    }
}

impl Receiver for ExecutionState {
    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn state(&mut self, dump: &StateDump) {
        self.qubit_count = dump.qubit_count as u64;
        self.states = dump
            .amplitudes
            .iter()
            .map(|(index, amplitude)| QubitState {
                id: format_state_id(*index, dump.qubit_count),
                amplitude_real: amplitude.re,
                amplitude_imaginary: amplitude.im,
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_options_constructors() {
        let options = ExecutionOptions::from_shots(10);
        assert_eq!(options.shots, 10);
        assert_eq!(options.noise, Noise::Ideal);

        let options = ExecutionOptions::from_noise(Noise::BitFlip { p: 0.1 }).with_seed(5);
        assert_eq!(options.shots, 1);
        assert_eq!(options.seed, Some(5));
    }

    #[test]
    fn test_options_from_json() {
        let options: ExecutionOptions = serde_json::from_str(
            r#"{"shots": 3, "noise": {"kind": "bit_flip", "p": 0.5}, "seed": 9}"#,
        )
        .unwrap();
        assert_eq!(
            options,
            ExecutionOptions::new(3, Noise::BitFlip { p: 0.5 }).with_seed(9)
        );
    }

    #[test]
    fn test_state_dump_replaces_previous() {
        let mut state = ExecutionState::default();
        let half = std::f64::consts::FRAC_1_SQRT_2;
        state.state(&StateDump {
            qubit_count: 2,
            amplitudes: vec![
                (0b00, Complex64::new(half, 0.0)),
                (0b11, Complex64::new(half, 0.0)),
            ],
        });
        state.state(&StateDump {
            qubit_count: 2,
            amplitudes: vec![(0b01, Complex64::new(0.0, 1.0))],
        });

        assert_eq!(state.qubit_count, 2);
        assert_eq!(state.states.len(), 1);
        assert_eq!(state.states[0].id, "|10⟩");
        assert_eq!(state.states[0].amplitude_imaginary, 1.0);
    }

    #[test]
    fn test_messages_keep_order() {
        let mut state = ExecutionState::default();
        state.message("a");
        state.message("b");
        assert_eq!(state.messages, vec!["a", "b"]);
        assert_eq!(state.result, None);
    }
}
