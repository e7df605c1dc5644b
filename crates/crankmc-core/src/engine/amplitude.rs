use super::error::EngineError;
use std::f64::consts::PI;
use tracing::debug;

/// Number of recorded outcomes between two amplitude adjustments.
pub const ADJUSTMENT_WINDOW: u64 = 1024;

/// How the controller treats each recorded outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationMode {
    /// Track the acceptance rate but never change the amplitude.
    Fixed,
    /// Adjust the amplitude at every window boundary.
    Tuning,
    /// Discard the counters before recording, then behave like [`Fixed`].
    ///
    /// [`Fixed`]: CalibrationMode::Fixed
    Reset,
}

/// Tracks move acceptance over fixed windows and steers the rotation
/// amplitude toward a target acceptance rate.
///
/// The amplitude may be negative (direction is folded into the rotation
/// angle draw); a negative sign marks it as adaptive, and only then does a
/// low acceptance rate shrink the magnitude. Either sign may grow, clamped
/// to `[-PI, PI]`.
#[derive(Debug, Clone)]
pub struct AmplitudeController {
    amplitude: f64,
    target_rate: f64,
    tolerance: f64,
    factor: f64,
    accepted: u64,
    rejected: u64,
    acceptance: f64,
}

impl AmplitudeController {
    pub fn new(amplitude: f64, target_rate: f64, tolerance: f64, factor: f64) -> Self {
        Self {
            amplitude,
            target_rate,
            tolerance,
            factor,
            accepted: 0,
            rejected: 0,
            acceptance: 0.0,
        }
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Acceptance rate measured over the last completed window; zero until
    /// the first window closes.
    pub fn acceptance_rate(&self) -> f64 {
        self.acceptance
    }

    /// Records one move outcome and, at a window boundary, recomputes the
    /// acceptance rate and (in [`CalibrationMode::Tuning`]) rescales the
    /// amplitude.
    pub fn record(&mut self, accepted: bool, mode: CalibrationMode) -> Result<(), EngineError> {
        if mode == CalibrationMode::Reset {
            self.accepted = 0;
            self.rejected = 0;
        }
        if accepted {
            self.accepted += 1;
        } else {
            self.rejected += 1;
        }

        let total = self.accepted + self.rejected;
        if total < ADJUSTMENT_WINDOW {
            return Ok(());
        }

        self.acceptance = self.accepted as f64 / total as f64;
        self.accepted = 0;
        self.rejected = 0;

        if mode != CalibrationMode::Tuning {
            return Ok(());
        }
        if !(0.0 < self.tolerance && self.tolerance < 1.0) {
            return Err(EngineError::Calibration(format!(
                "acceptance tolerance must lie in (0, 1), got {}",
                self.tolerance
            )));
        }
        if !(0.0 < self.factor && self.factor < 1.0) {
            return Err(EngineError::Calibration(format!(
                "amplitude changing factor must lie in (0, 1), got {}",
                self.factor
            )));
        }

        let before = self.amplitude;
        if self.amplitude < 0.0 && self.acceptance < self.target_rate - self.tolerance {
            // Only a negative (adaptive-sign) amplitude may shrink; a
            // positive one is pinned from below.
            self.amplitude *= self.factor;
        } else if self.acceptance > self.target_rate + self.tolerance {
            // Too many acceptances: bolder perturbations.
            self.amplitude /= self.factor;
        }
        self.amplitude = self.amplitude.clamp(-PI, PI);

        if self.amplitude != before {
            debug!(
                acceptance = self.acceptance,
                amplitude = self.amplitude,
                "rescaled move amplitude"
            );
        }
        Ok(())
    }
}
