use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crankmc::core::energy::CaContactModel;
use crankmc::engine::config::SamplingConfig;
use serde::Deserialize;
use std::path::Path;

/// Template emitted by `crankmc init-config`.
pub const DEFAULT_CONFIG: &str = r#"# CrankMC run configuration.
# Every key is optional; the defaults below match the built-in ones.

[run]
# One-letter sequence, '|' separates chains.
sequence = "AGLVKEFTSIMN"
steps = 100000
calibration_windows = 8
# seed = 42
# Indices of residues excluded from every move window (1-based slots).
fixed = []
# Negated energy bound for Nested Sampling; ignored under Metropolis.
log_l_star = 0.0

[sampling]
amplitude = -0.7853981633974483
thermobeta = 1.0
nested_sampling = false
acceptance_rate = 0.5
acceptance_rate_tolerance = 0.05
amplitude_changing_factor = 0.9
fix_ca_atoms = false
fix_chi_angles = false
use_sidechain_gamma = true
external_potential = "none"
external_k = 1.0

[model]
r_min = 6.0
well_depth = 0.3
torsion_barrier = 0.4
slab_halfwidth = 15.0
slab_k = 0.5
"#;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunFile {
    pub run: RunSection,
    pub sampling: SamplingConfig,
    pub model: ModelSection,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    pub sequence: Option<String>,
    pub steps: u64,
    pub calibration_windows: u64,
    pub seed: Option<u64>,
    pub fixed: Vec<usize>,
    pub log_l_star: f64,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            sequence: None,
            steps: 100_000,
            calibration_windows: 8,
            seed: None,
            fixed: Vec::new(),
            log_l_star: 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelSection {
    pub r_min: f64,
    pub well_depth: f64,
    pub torsion_barrier: f64,
    pub slab_halfwidth: f64,
    pub slab_k: f64,
}

impl Default for ModelSection {
    fn default() -> Self {
        let model = CaContactModel::default();
        Self {
            r_min: model.r_min,
            well_depth: model.well_depth,
            torsion_barrier: model.torsion_barrier,
            slab_halfwidth: model.slab_halfwidth,
            slab_k: model.slab_k,
        }
    }
}

impl ModelSection {
    pub fn to_model(&self) -> CaContactModel {
        CaContactModel {
            r_min: self.r_min,
            well_depth: self.well_depth,
            torsion_barrier: self.torsion_barrier,
            slab_halfwidth: self.slab_halfwidth,
            slab_k: self.slab_k,
        }
    }
}

impl RunFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|source| CliError::ConfigParsing {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Folds command-line overrides into the file-loaded (or default)
    /// configuration. Flags always win.
    pub fn apply_overrides(&mut self, args: &RunArgs) {
        if let Some(sequence) = &args.sequence {
            self.run.sequence = Some(sequence.clone());
        }
        if let Some(steps) = args.steps {
            self.run.steps = steps;
        }
        if let Some(windows) = args.calibration_windows {
            self.run.calibration_windows = windows;
        }
        if let Some(seed) = args.seed {
            self.run.seed = Some(seed);
        }
        if let Some(thermobeta) = args.thermobeta {
            self.sampling.thermobeta = thermobeta;
        }
        if let Some(amplitude) = args.amplitude {
            self.sampling.amplitude = amplitude;
        }
        if args.nested_sampling {
            self.sampling.nested_sampling = true;
        }
        if let Some(log_l_star) = args.log_l_star {
            self.run.log_l_star = log_l_star;
        }
    }

    pub fn sampling(&self) -> SamplingConfig {
        self.sampling.clone()
    }
}
