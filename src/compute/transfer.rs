//! Bounded transfer functions applied to a reaction's aggregated input.

use serde::{Deserialize, Serialize};

/// Largest magnitude strictly below 1.0 that survives `2x - 1` rounding.
const OPEN_UNIT: f64 = 1.0 - f64::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferFunction {
    /// Identity. Unbounded; rely on weight scaling to keep signals in range.
    Linear,
    /// `tanh(βx)`, in (-1, 1).
    Tanh,
    /// `1 / (1 + e^(-βx))`, in (0, 1).
    Logistic,
    /// `2·logistic(x) - 1`, in (-1, 1).
    SymmetricLogistic,
}

/// A transfer function together with its steepness β.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub function: TransferFunction,
    pub steepness: f64,
}

impl Default for Transfer {
    fn default() -> Self {
        Self { function: TransferFunction::SymmetricLogistic, steepness: 3.0 }
    }
}

impl Transfer {
    pub fn new(function: TransferFunction, steepness: f64) -> Self {
        Self { function, steepness }
    }

    pub fn linear() -> Self {
        Self::new(TransferFunction::Linear, 1.0)
    }

    /// Applies the transfer function. NaN propagates unchanged. Bounded
    /// functions never reach their bounds, even when saturated.
    #[inline]
    pub fn apply(&self, x: f64) -> f64 {
        let beta = self.steepness;
        match self.function {
            TransferFunction::Linear => x,
            TransferFunction::Tanh => (beta * x).tanh().clamp(-OPEN_UNIT, OPEN_UNIT),
            TransferFunction::Logistic => self.sigmoid(x),
            // 2σ(βx) - 1 == tanh(βx / 2), which avoids cancellation near 0.
            TransferFunction::SymmetricLogistic => (0.5 * beta * x).tanh().clamp(-OPEN_UNIT, OPEN_UNIT),
        }
    }

    /// Logistic with this transfer's steepness, strictly inside (0, 1).
    /// Also used for catalyst and regulation gates.
    #[inline]
    pub fn sigmoid(&self, x: f64) -> f64 {
        (1.0 / (1.0 + (-self.steepness * x).exp())).clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON / 2.0)
    }
}
