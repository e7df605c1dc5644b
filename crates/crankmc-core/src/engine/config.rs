use serde::Deserialize;

/// External potential selector. `Membrane` additionally enables the
/// translational sub-move after accepted pivot rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExternalPotential {
    #[default]
    None,
    Membrane,
}

/// Parameters of the sampling engine for one run.
///
/// A negative `amplitude` follows the original sign convention: the
/// magnitude is the rotation bound, and the sign marks the amplitude as
/// adaptive, allowing the controller to shrink it towards zero.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub amplitude: f64,
    pub thermobeta: f64,
    pub nested_sampling: bool,
    pub acceptance_rate: f64,
    pub acceptance_rate_tolerance: f64,
    pub amplitude_changing_factor: f64,
    pub fix_ca_atoms: bool,
    pub fix_chi_angles: bool,
    pub use_sidechain_gamma: bool,
    pub external_potential: ExternalPotential,
    pub external_k: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            amplitude: -std::f64::consts::FRAC_PI_4,
            thermobeta: 1.0,
            nested_sampling: false,
            acceptance_rate: 0.5,
            acceptance_rate_tolerance: 0.05,
            amplitude_changing_factor: 0.9,
            fix_ca_atoms: false,
            fix_chi_angles: false,
            use_sidechain_gamma: true,
            external_potential: ExternalPotential::None,
            external_k: 1.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct SamplingConfigBuilder {
    config: SamplingConfig,
}

impl SamplingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn amplitude(mut self, amplitude: f64) -> Self {
        self.config.amplitude = amplitude;
        self
    }
    pub fn thermobeta(mut self, thermobeta: f64) -> Self {
        self.config.thermobeta = thermobeta;
        self
    }
    pub fn nested_sampling(mut self, enabled: bool) -> Self {
        self.config.nested_sampling = enabled;
        self
    }
    pub fn acceptance_rate(mut self, rate: f64) -> Self {
        self.config.acceptance_rate = rate;
        self
    }
    pub fn acceptance_rate_tolerance(mut self, tolerance: f64) -> Self {
        self.config.acceptance_rate_tolerance = tolerance;
        self
    }
    pub fn amplitude_changing_factor(mut self, factor: f64) -> Self {
        self.config.amplitude_changing_factor = factor;
        self
    }
    pub fn fix_ca_atoms(mut self, fixed: bool) -> Self {
        self.config.fix_ca_atoms = fixed;
        self
    }
    pub fn fix_chi_angles(mut self, fixed: bool) -> Self {
        self.config.fix_chi_angles = fixed;
        self
    }
    pub fn use_sidechain_gamma(mut self, enabled: bool) -> Self {
        self.config.use_sidechain_gamma = enabled;
        self
    }
    pub fn external_potential(mut self, potential: ExternalPotential) -> Self {
        self.config.external_potential = potential;
        self
    }
    pub fn external_k(mut self, k: f64) -> Self {
        self.config.external_k = k;
        self
    }

    pub fn build(self) -> SamplingConfig {
        self.config
    }
}
