//! Pauli noise types.
//!
//! Noise is modelled as a single-qubit Pauli channel: after a gate (and
//! before a measurement) each affected qubit independently receives an X,
//! Y or Z error with the probabilities of a [`PauliDistribution`]. The
//! named channels in [`Noise`] are shorthands for common distributions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{IrError, IrResult};

/// Probabilities of an X, Y and Z error on one qubit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PauliDistribution {
    x: f64,
    y: f64,
    z: f64,
}

impl PauliDistribution {
    /// Create a distribution, rejecting negative values or a total above 1.
    pub fn new(x: f64, y: f64, z: f64) -> IrResult<Self> {
        let valid = [x, y, z].iter().all(|p| p.is_finite() && *p >= 0.0);
        if !valid || x + y + z > 1.0 {
            return Err(IrError::InvalidPauliDistribution);
        }
        Ok(Self { x, y, z })
    }

    /// The noiseless distribution.
    pub fn ideal() -> Self {
        Self::default()
    }

    /// Probability of an X error.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Probability of a Y error.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Probability of a Z error.
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Whether no error can ever occur.
    pub fn is_ideal(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

/// A noise configuration for simulation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Noise {
    /// No noise.
    #[default]
    Ideal,
    /// An explicit Pauli distribution.
    Pauli {
        /// The error probabilities.
        noise: PauliDistribution,
    },
    /// X error with probability `p`.
    BitFlip {
        /// Flip probability (0.0 to 1.0).
        p: f64,
    },
    /// Z error with probability `p`.
    PhaseFlip {
        /// Flip probability (0.0 to 1.0).
        p: f64,
    },
    /// X, Y or Z error, each with probability `p / 3`.
    Depolarizing {
        /// Total error probability (0.0 to 1.0).
        p: f64,
    },
}

impl Noise {
    /// Resolve this noise into a validated Pauli distribution.
    pub fn distribution(&self) -> IrResult<PauliDistribution> {
        match *self {
            Noise::Ideal => Ok(PauliDistribution::ideal()),
            Noise::Pauli { noise } => PauliDistribution::new(noise.x, noise.y, noise.z),
            Noise::BitFlip { p } => PauliDistribution::new(check_probability(p)?, 0.0, 0.0),
            Noise::PhaseFlip { p } => PauliDistribution::new(0.0, 0.0, check_probability(p)?),
            Noise::Depolarizing { p } => {
                let third = check_probability(p)? / 3.0;
                PauliDistribution::new(third, third, third)
            }
        }
    }
}

fn check_probability(p: f64) -> IrResult<f64> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(IrError::InvalidProbability(p))
    }
}

impl fmt::Display for Noise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Noise::Ideal => write!(f, "ideal"),
            Noise::Pauli { noise } => write!(f, "pauli:{},{},{}", noise.x, noise.y, noise.z),
            Noise::BitFlip { p } => write!(f, "bit-flip:{p}"),
            Noise::PhaseFlip { p } => write!(f, "phase-flip:{p}"),
            Noise::Depolarizing { p } => write!(f, "depolarizing:{p}"),
        }
    }
}

/// Parses the textual form used on the command line, e.g. `bit-flip:0.01`
/// or `pauli:0.01,0.0,0.02`.
impl FromStr for Noise {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, arg) = match s.split_once(':') {
            Some((kind, arg)) => (kind.trim(), Some(arg.trim())),
            None => (s.trim(), None),
        };

        let prob = |arg: Option<&str>| -> Result<f64, String> {
            let arg = arg.ok_or_else(|| format!("noise '{kind}' needs a probability"))?;
            arg.parse::<f64>()
                .map_err(|e| format!("invalid probability '{arg}': {e}"))
        };

        let noise = match kind {
            "ideal" | "none" => Noise::Ideal,
            "bit-flip" | "bitflip" => Noise::BitFlip { p: prob(arg)? },
            "phase-flip" | "phaseflip" => Noise::PhaseFlip { p: prob(arg)? },
            "depolarizing" => Noise::Depolarizing { p: prob(arg)? },
            "pauli" => {
                let arg = arg.ok_or("noise 'pauli' needs x,y,z probabilities")?;
                let parts = arg
                    .split(',')
                    .map(|v| v.trim().parse::<f64>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| format!("invalid pauli probabilities '{arg}': {e}"))?;
                let [x, y, z] = parts[..] else {
                    return Err(format!("expected 3 pauli probabilities, got {}", parts.len()));
                };
                let noise = PauliDistribution::new(x, y, z).map_err(|e| e.to_string())?;
                Noise::Pauli { noise }
            }
            other => return Err(format!("unknown noise model '{other}'")),
        };

        noise.distribution().map_err(|e| e.to_string())?;
        Ok(noise)
    }
}
