use super::amplitude::{AmplitudeController, CalibrationMode};
use super::config::{ExternalPotential, SamplingConfig};
use super::error::EngineError;
use super::lookup::MoveLookupTable;
use super::matrix::{self, EnergyMatrixCache};
use super::moves::{self, MoveClass, MoveWindow};
use super::staging::TrialStagingBuffer;
use crate::core::energy::EnergyModel;
use crate::core::models::chain::Conformation;
use nalgebra::Vector3;
use rand::{Rng, RngCore};
use tracing::debug;

/// Probability per axis that the translation sub-move shifts the chain.
const TRANSLATION_AXIS_PROBABILITY: f64 = 0.1;
/// Maps the firing variate onto a displacement in (-0.2, 0.2) Angstrom.
const TRANSLATION_SCALE: f64 = 4.0;

/// Owns everything a sampling run needs besides the conformation itself:
/// the move lookup table, the staging buffer, the committed energy matrix
/// and the amplitude controller.
///
/// One call to [`MoveDriver::step`] is one Markov-chain step: propose a
/// segment rotation, evaluate its energy delta incrementally, decide, and
/// commit or discard.
pub struct MoveDriver {
    config: SamplingConfig,
    lookup: MoveLookupTable,
    staging: TrialStagingBuffer,
    energy: EnergyMatrixCache,
    amplitude: AmplitudeController,
}

impl MoveDriver {
    pub fn new<M: EnergyModel>(
        chain: &Conformation,
        config: SamplingConfig,
        model: &M,
    ) -> Result<Self, EngineError> {
        let lookup = MoveLookupTable::build(chain)?;
        let staging = TrialStagingBuffer::new(chain);
        let energy = EnergyMatrixCache::initialize(chain, model);
        let amplitude = AmplitudeController::new(
            config.amplitude,
            config.acceptance_rate,
            config.acceptance_rate_tolerance,
            config.amplitude_changing_factor,
        );
        debug!(
            naa = chain.naa(),
            nchains = chain.nchains(),
            total_energy = energy.total_energy(),
            "move driver initialized"
        );
        Ok(Self {
            config,
            lookup,
            staging,
            energy,
            amplitude,
        })
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude.amplitude()
    }

    pub fn acceptance_rate(&self) -> f64 {
        self.amplitude.acceptance_rate()
    }

    pub fn energy(&self) -> &EnergyMatrixCache {
        &self.energy
    }

    /// Total energy of the committed conformation, as tracked by the
    /// pairwise matrix. Callers seed their running-energy accumulator with
    /// this before the first step.
    pub fn total_energy(&self) -> f64 {
        self.energy.total_energy()
    }

    /// Proposes one move, evaluates it and commits it into `chain` when
    /// accepted. Returns whether the move was accepted. `curr_e` is the
    /// caller's running energy; it is only reduced on acceptance.
    pub fn propose_and_evaluate<M: EnergyModel>(
        &mut self,
        chain: &mut Conformation,
        model: &M,
        log_l_star: f64,
        curr_e: &mut f64,
        rng: &mut dyn RngCore,
    ) -> Result<bool, EngineError> {
        self.staging.stage_step(chain);
        moves::resample_sidechains(chain, &mut self.staging, &self.config, model, rng);

        let (start, end) = moves::select_window(&self.lookup, chain, &self.config, rng)?;
        let class = moves::classify(chain, start, end, rng)?;
        let window = moves::build_trial(
            chain,
            &mut self.staging,
            start,
            end,
            class,
            self.amplitude.amplitude(),
            rng,
        );

        let delta = self
            .energy
            .evaluate(chain, &mut self.staging, window.start, window.end, model);
        if !matrix::accept_move(&delta, &self.config, log_l_star, *curr_e, rng) {
            return Ok(false);
        }

        self.energy
            .commit_window(&self.staging, window.start, window.end, &delta, curr_e);
        commit_conformation(chain, &self.staging, &window);

        if window.class != MoveClass::Crankshaft
            && self.config.external_potential == ExternalPotential::Membrane
        {
            self.translation_submove(chain, model, rng);
        }

        Ok(true)
    }

    /// Feeds the outcome to the amplitude controller.
    pub fn record_outcome(
        &mut self,
        accepted: bool,
        mode: CalibrationMode,
    ) -> Result<(), EngineError> {
        self.amplitude.record(accepted, mode)
    }

    /// One full Markov-chain step: propose, decide, commit, record.
    pub fn step<M: EnergyModel>(
        &mut self,
        chain: &mut Conformation,
        model: &M,
        log_l_star: f64,
        curr_e: &mut f64,
        mode: CalibrationMode,
        rng: &mut dyn RngCore,
    ) -> Result<bool, EngineError> {
        let accepted = self.propose_and_evaluate(chain, model, log_l_star, curr_e, rng)?;
        self.record_outcome(accepted, mode)?;
        Ok(accepted)
    }

    /// Rigid whole-system translation, proposed after accepted pivots when
    /// a membrane potential is active. Tested against the global term only;
    /// the pairwise matrix is translation-invariant.
    fn translation_submove<M: EnergyModel>(
        &mut self,
        chain: &mut Conformation,
        model: &M,
        rng: &mut dyn RngCore,
    ) {
        let mut shift = Vector3::zeros();
        let mut moved = false;
        for axis in 0..3 {
            let p: f64 = rng.r#gen();
            if p < TRANSLATION_AXIS_PROBABILITY {
                shift[axis] = TRANSLATION_SCALE * (p - TRANSLATION_AXIS_PROBABILITY / 2.0);
                moved = true;
            }
        }
        if !moved {
            return;
        }

        let naa = chain.naa();
        for i in 1..naa {
            let committed = chain.residue(i);
            let trial = &mut self.staging.residues[i];
            trial.ca = committed.ca + shift;
            trial.n = committed.n + shift;
            trial.c = committed.c + shift;
            trial.o = committed.o + shift;
            if committed.has_amide_h() {
                trial.h = committed.h + shift;
            }
            if committed.has_cb() {
                trial.cb = committed.cb + shift;
            }
            if let Some(g) = committed.g {
                trial.g = Some(g + shift);
            }
        }

        let old_global = self.energy.matrix().global();
        let new_global =
            model.global_energy(1, naa - 1, chain.residue_slots(), &self.staging.residues);

        let u: f64 = rng.r#gen();
        let accept = new_global < old_global
            || (self.config.thermobeta * (new_global - old_global)).exp() < u;
        if !accept {
            return;
        }

        for i in 1..naa {
            *chain.residue_mut(i) = self.staging.residues[i].clone();
        }
        self.energy.set_global(new_global);
        debug!(
            dx = shift.x,
            dy = shift.y,
            dz = shift.z,
            new_global,
            "translated system"
        );
    }
}

/// Writes an accepted candidate's coordinates and frames back into the
/// committed conformation.
fn commit_conformation(chain: &mut Conformation, staging: &TrialStagingBuffer, window: &MoveWindow) {
    let naa = chain.naa();
    let cid = chain.residue(window.end.min(naa - 1)).chain as usize;

    // For a start-pivot the rotated frames run one past the adjusted end.
    let frame_end = if window.class == MoveClass::PivotAroundStart {
        window.end + 1
    } else {
        window.end
    };
    for i in window.start..frame_end.min(naa) {
        chain.set_frame(i, staging.frames[i]);
    }
    if window.class == MoveClass::PivotAroundEnd {
        chain.set_prev_frame(cid, staging.prev_frames[cid]);
    }
    for i in window.start..=window.end {
        *chain.residue_mut(i) = staging.residues[i].clone();
    }
}
