use super::config::SamplingConfig;
use super::staging::TrialStagingBuffer;
use crate::core::energy::EnergyModel;
use crate::core::models::chain::Conformation;
use rand::{Rng, RngCore};
use tracing::trace;

/// Global-energy level above which the external coupling is weakened.
/// Preserved literally from the reference implementation.
const EXTERNAL_COUPLING_CUTOFF: f64 = 10.0;
const WEAK_EXTERNAL_COUPLING: f64 = 0.01;

/// Dense symmetric pairwise-energy matrix.
///
/// Cell `[0][0]` is reserved for the current global/external term. Symmetry
/// is enforced structurally: the only mutating accessor writes both
/// triangles in one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyMatrix {
    n: usize,
    cells: Vec<f64>,
}

impl EnergyMatrix {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            cells: vec![0.0; n * n],
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.cells[i * self.n + j]
    }

    /// Writes `E[i][j]` and `E[j][i]` together; asymmetric updates are not
    /// expressible.
    #[inline]
    pub fn set_sym(&mut self, i: usize, j: usize, value: f64) {
        self.cells[i * self.n + j] = value;
        self.cells[j * self.n + i] = value;
    }

    #[inline]
    pub fn global(&self) -> f64 {
        self.cells[0]
    }

    #[inline]
    pub fn set_global(&mut self, value: f64) {
        self.cells[0] = value;
    }
}

/// Trial sub-matrix holding the recomputed rows for one move window.
#[derive(Debug, Clone)]
pub struct TrialRows {
    start: usize,
    n: usize,
    cells: Vec<f64>,
}

impl TrialRows {
    pub(crate) fn new(n: usize) -> Self {
        // Widest possible window is 5 residues (4 bonds) plus the pivot
        // adjustment; sizing for n rows keeps this allocation one-shot.
        Self {
            start: 0,
            n,
            cells: vec![0.0; n * n.min(6)],
        }
    }

    pub(crate) fn reset(&mut self, start: usize, end: usize) {
        self.start = start;
        let rows = end - start + 1;
        if self.cells.len() < rows * self.n {
            self.cells.resize(rows * self.n, 0.0);
        }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.cells[(i - self.start) * self.n + j]
    }

    #[inline]
    pub(crate) fn set(&mut self, i: usize, j: usize, value: f64) {
        self.cells[(i - self.start) * self.n + j] = value;
    }
}

/// Energy change of one candidate move. Losses are old-minus-new: a
/// negative loss means the energy went up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyDelta {
    pub internal_loss: f64,
    pub external_loss: f64,
    pub new_global: f64,
}

/// The committed pairwise-energy state of one conformation, plus the
/// incremental-evaluation and commit discipline around it.
#[derive(Debug, Clone)]
pub struct EnergyMatrixCache {
    committed: EnergyMatrix,
}

impl EnergyMatrixCache {
    /// Full O(N^2) initialization; done once per run, after which every
    /// step only recomputes the rows of its move window.
    pub fn initialize<M: EnergyModel>(chain: &Conformation, model: &M) -> Self {
        let naa = chain.naa();
        let mut committed = EnergyMatrix::new(naa);
        for i in 1..naa {
            committed.set_sym(i, i, model.self_energy(chain.residue(i)));
            for j in i + 1..naa {
                committed.set_sym(i, j, model.pair_energy(chain.residue(i), chain.residue(j)));
            }
        }
        let global = model.global_energy(0, 0, chain.residue_slots(), chain.residue_slots());
        committed.set_global(global);
        Self { committed }
    }

    pub fn matrix(&self) -> &EnergyMatrix {
        &self.committed
    }

    pub(crate) fn set_global(&mut self, value: f64) {
        self.committed.set_global(value);
    }

    /// Total committed energy: each unordered pair once, self terms, and
    /// the global cell. This is the starting value of the running energy
    /// tracker that `commit_window` keeps in sync.
    pub fn total_energy(&self) -> f64 {
        let n = self.committed.n();
        let mut total = self.committed.global();
        for i in 1..n {
            for j in i..n {
                total += self.committed.get(i, j);
            }
        }
        total
    }

    /// Recomputes the pairwise rows for `start..=end` into the staging
    /// buffer's trial sub-matrix and returns the resulting energy delta.
    ///
    /// Operand selection per column: committed partner outside the window,
    /// trial partner inside, self-energy on the diagonal. Entries with
    /// `start <= j < i` are filled from the already-computed `(j, i)` cell;
    /// the inner loop must keep iterating `j` upward for that to be sound.
    pub fn evaluate<M: EnergyModel>(
        &self,
        chain: &Conformation,
        staging: &mut TrialStagingBuffer,
        start: usize,
        end: usize,
        model: &M,
    ) -> EnergyDelta {
        let naa = chain.naa();
        staging.trial_rows.reset(start, end);

        let mut internal_loss = 0.0;
        for i in start..=end {
            for j in 1..naa {
                let q = if j < start || j > end {
                    model.pair_energy(&staging.residues[i], chain.residue(j))
                } else if j > i {
                    model.pair_energy(&staging.residues[i], &staging.residues[j])
                } else if j == i {
                    model.self_energy(&staging.residues[i])
                } else {
                    // Double jeopardy: (j, i) was computed earlier this pass.
                    let value = staging.trial_rows.get(j, i);
                    staging.trial_rows.set(i, j, value);
                    continue;
                };
                staging.trial_rows.set(i, j, q);
                internal_loss += self.committed.get(i, j) - q;
            }
        }

        let new_global =
            model.global_energy(start, end, chain.residue_slots(), &staging.residues);
        let external_loss = self.committed.global() - new_global;

        trace!(
            start,
            end,
            internal_loss,
            external_loss,
            new_global,
            "evaluated move window"
        );

        EnergyDelta {
            internal_loss,
            external_loss,
            new_global,
        }
    }

    /// Copies the trial rows into the committed matrix symmetrically,
    /// updates the global cell, and reduces the running energy tracker.
    pub fn commit_window(
        &mut self,
        staging: &TrialStagingBuffer,
        start: usize,
        end: usize,
        delta: &EnergyDelta,
        running_energy: &mut f64,
    ) {
        let naa = self.committed.n();
        for i in start..=end {
            for j in 1..naa {
                self.committed.set_sym(i, j, staging.trial_rows.get(i, j));
            }
        }
        self.committed.set_global(delta.new_global);
        *running_energy -= delta.internal_loss + delta.external_loss;
    }
}

/// The combined Metropolis / Nested-Sampling acceptance decision.
///
/// Draw order matches the reference implementation: the uniform variate for
/// the Metropolis test is only consumed when that branch actually fires.
pub(crate) fn accept_move(
    delta: &EnergyDelta,
    config: &SamplingConfig,
    log_l_star: f64,
    running_energy: f64,
    rng: &mut dyn RngCore,
) -> bool {
    let mut external_k = config.external_k;
    if delta.new_global > EXTERNAL_COUPLING_CUTOFF {
        external_k = WEAK_EXTERNAL_COUPLING;
    }

    let loss = delta.internal_loss;
    if loss < 0.0 && !config.nested_sampling {
        let u: f64 = rng.r#gen();
        if (config.thermobeta * (loss + delta.external_loss)).exp() < external_k * u {
            return false;
        }
    }

    if config.nested_sampling && nested_sampling_rejects(log_l_star, running_energy, loss) {
        return false;
    }

    true
}

/// Nested-Sampling rejection predicate: once the likelihood threshold has
/// been reached, accepted states must keep the energy below it; above it,
/// only energy-decreasing moves pass.
#[inline]
pub fn nested_sampling_rejects(log_l_star: f64, running_energy: f64, loss: f64) -> bool {
    (-log_l_star > running_energy && -log_l_star < running_energy - loss)
        || (-log_l_star < running_energy && loss < 0.0)
}

/// Metropolis acceptance probability for a candidate with the given losses,
/// before external-coupling scaling. Unity whenever the move does not raise
/// the energy.
#[inline]
pub fn metropolis_acceptance(thermobeta: f64, internal_loss: f64, external_loss: f64) -> f64 {
    if internal_loss >= 0.0 {
        1.0
    } else {
        (thermobeta * (internal_loss + external_loss)).exp().min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn set_sym_writes_both_triangles() {
        let mut matrix = EnergyMatrix::new(5);
        matrix.set_sym(1, 3, -2.5);
        assert_eq!(matrix.get(1, 3), -2.5);
        assert_eq!(matrix.get(3, 1), -2.5);
    }

    #[test]
    fn global_cell_is_the_reserved_diagonal_slot() {
        let mut matrix = EnergyMatrix::new(4);
        matrix.set_global(7.25);
        assert_eq!(matrix.global(), 7.25);
        assert_eq!(matrix.get(0, 0), 7.25);
    }

    #[test]
    fn metropolis_acceptance_is_bounded_and_unity_for_favorable_moves() {
        assert_eq!(metropolis_acceptance(1.0, 0.0, -5.0), 1.0);
        assert_eq!(metropolis_acceptance(1.0, 3.0, 0.0), 1.0);
        let p = metropolis_acceptance(1.0, -2.0, -1.0);
        assert!(p > 0.0 && p < 1.0);
        assert_relative_eq!(p, (-3.0f64).exp(), epsilon = 1e-12);
        assert!(metropolis_acceptance(5.0, -0.001, 0.5) <= 1.0);
    }

    #[test]
    fn nested_sampling_rejects_moves_that_cross_back_over_the_threshold() {
        // Below threshold (-logLstar > E), move would end above: reject.
        assert!(nested_sampling_rejects(-1.0, 0.5, -1.0));
        // Below threshold, move stays below: accept.
        assert!(!nested_sampling_rejects(-1.0, 0.5, 0.2));
        // Above threshold, move does not decrease energy: reject.
        assert!(nested_sampling_rejects(-1.0, 2.0, -0.3));
        // Above threshold, move decreases energy: accept.
        assert!(!nested_sampling_rejects(-1.0, 2.0, 0.3));
    }

    #[test]
    fn accept_move_is_unconditional_for_non_negative_loss() {
        let delta = EnergyDelta {
            internal_loss: 0.0,
            external_loss: 0.0,
            new_global: 0.0,
        };
        let config = SamplingConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..32 {
            assert!(accept_move(&delta, &config, 0.0, 0.0, &mut rng));
        }
    }

    #[test]
    fn accept_move_rejects_hopeless_uphill_moves() {
        let delta = EnergyDelta {
            internal_loss: -1e6,
            external_loss: 0.0,
            new_global: 0.0,
        };
        let config = SamplingConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        let rejected = (0..32).filter(|_| !accept_move(&delta, &config, 0.0, 0.0, &mut rng));
        assert_eq!(rejected.count(), 32);
    }

    #[test]
    fn external_coupling_weakens_above_the_cutoff() {
        // Moderately uphill move: with the weakened coupling (k = 0.01) the
        // rejection condition exp(beta * loss) < k * u almost never fires.
        let delta = EnergyDelta {
            internal_loss: -2.0,
            external_loss: 0.0,
            new_global: EXTERNAL_COUPLING_CUTOFF + 1.0,
        };
        let config = SamplingConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let accepted = (0..256)
            .filter(|_| accept_move(&delta, &config, 0.0, 0.0, &mut rng))
            .count();
        assert!(accepted > 200, "got {accepted}/256");
    }
}
