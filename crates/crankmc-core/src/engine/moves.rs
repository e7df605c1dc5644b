use super::config::SamplingConfig;
use super::error::EngineError;
use super::lookup::MoveLookupTable;
use super::staging::TrialStagingBuffer;
use crate::core::energy::EnergyModel;
use crate::core::geometry::{self, CA_CA_DISTANCE};
use crate::core::models::chain::Conformation;
use rand::{Rng, RngCore};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveClass {
    /// Internal segment rotated about the axis joining its boundary CAs.
    Crankshaft,
    /// Segment rotated about its start anchor; the end is a free terminus.
    PivotAroundStart,
    /// Segment rotated about its end anchor; the start is a free terminus.
    PivotAroundEnd,
}

/// The residue window a built candidate actually touches, after the
/// pivot-side adjustment. Commit and evaluation both operate on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveWindow {
    pub start: usize,
    pub end: usize,
    pub class: MoveClass,
}

/// Resamples side-chain dihedrals into the staging buffer with probability
/// 1/4, unless disabled. Residues without the corresponding dihedral keep
/// their committed values (already staged).
pub(crate) fn resample_sidechains<M: EnergyModel>(
    chain: &Conformation,
    staging: &mut TrialStagingBuffer,
    config: &SamplingConfig,
    model: &M,
    rng: &mut dyn RngCore,
) {
    if !config.use_sidechain_gamma || config.fix_chi_angles {
        return;
    }
    if rng.r#gen::<f64>() >= 0.25 {
        return;
    }
    for i in 1..chain.naa() {
        let residue = chain.residue(i);
        if residue.has_chi1() && residue.chi1.is_some() {
            staging.residues[i].chi1 = Some(model.sidechain_dihedral(residue.code, rng));
        }
        if residue.has_chi2() && residue.chi2.is_some() {
            let chi1 = staging.residues[i].chi1.unwrap_or_default();
            staging.residues[i].chi2 = Some(model.sidechain_dihedral2(residue.code, chi1, rng));
        }
    }
}

/// Draws a move window from the lookup table. The returned `(start, end)`
/// is the raw selection; classification and the pivot adjustment happen in
/// [`build_trial`].
pub(crate) fn select_window(
    lookup: &MoveLookupTable,
    chain: &Conformation,
    config: &SamplingConfig,
    rng: &mut dyn RngCore,
) -> Result<(usize, usize), EngineError> {
    let naa = chain.naa();
    let toss: u32 = rng.r#gen();
    let (length, start) = lookup.sample(toss, naa)?;

    let end = if config.fix_ca_atoms {
        start + 1
    } else {
        start + length + 1
    };

    for index in start.max(1)..end.min(naa) {
        if chain.residue(index).flags.fixed {
            return Err(EngineError::FixedResidueInWindow { index, start, end });
        }
    }

    Ok((start, end))
}

/// Classifies the window as crankshaft or one of the pivots, resolving
/// chain breaks inside the window to whichever pivot keeps the move on a
/// single segment; the two-residue break case is an unbiased coin flip.
pub(crate) fn classify(
    chain: &Conformation,
    start: usize,
    end: usize,
    rng: &mut dyn RngCore,
) -> Result<MoveClass, EngineError> {
    let naa = chain.naa();
    if start == 0 {
        return Ok(MoveClass::PivotAroundEnd);
    }
    if end == naa {
        return Ok(MoveClass::PivotAroundStart);
    }
    if chain.residue(start).chain == chain.residue(end).chain {
        return Ok(MoveClass::Crankshaft);
    }

    if end - start == 1 {
        // Two residues across a break: pick the pivot side by coin flip.
        return Ok(if rng.r#gen::<bool>() {
            MoveClass::PivotAroundStart
        } else {
            MoveClass::PivotAroundEnd
        });
    }
    if chain.residue(start).chain == chain.residue(start + 1).chain {
        Ok(MoveClass::PivotAroundStart)
    } else if chain.residue(end).chain == chain.residue(end - 1).chain {
        Ok(MoveClass::PivotAroundEnd)
    } else {
        Err(EngineError::Classification { start, end })
    }
}

/// Builds the rotated candidate into the staging buffer and returns the
/// adjusted window of touched residues. The committed conformation is not
/// mutated.
pub(crate) fn build_trial(
    chain: &Conformation,
    staging: &mut TrialStagingBuffer,
    start: usize,
    end: usize,
    class: MoveClass,
    amplitude: f64,
    rng: &mut dyn RngCore,
) -> MoveWindow {
    let naa = chain.naa();
    let pivot_around_end = class == MoveClass::PivotAroundEnd;
    let pivot_around_start = class == MoveClass::PivotAroundStart;
    // Chain whose boundary frame the move may touch. `end == naa` only
    // happens for start-pivots, where the last residue is on that chain.
    let cid = chain.residue(end.min(naa - 1)).chain as usize;

    // Fixed anchors for the untouched side(s) of the window.
    if !pivot_around_end {
        staging.frames[start] = chain.frame(start);
        staging.residues[start].ca = chain.residue(start).ca;
        if start == 1 || chain.residue(start).chain != chain.residue(start - 1).chain {
            staging.prev_frames[cid] = chain.prev_frame(cid);
        } else {
            staging.frames[start - 1] = chain.frame(start - 1);
        }
    } else {
        staging.prev_frames[cid] = chain.prev_frame(cid);
    }
    if !pivot_around_start {
        staging.frames[end] = chain.frame(end);
        staging.residues[end].ca = chain.residue(end).ca;
    }

    // Rotation angle uniform in [-amplitude, +amplitude]; axis along the
    // boundary CAs for a crankshaft, random for a pivot.
    let alpha = amplitude * (2.0 * rng.r#gen::<f64>() - 1.0);
    let axis = if class == MoveClass::Crankshaft {
        (chain.residue(end).ca - chain.residue(start).ca).normalize()
    } else {
        geometry::random_unit_vector(rng)
    };
    let rot = geometry::rotation_about_axis(&axis, alpha);

    // Rotate the CA->CA frames inside the window. For an end-pivot the
    // first unit is the chain's boundary frame, not a regular frame (which
    // would belong to the previous chain).
    for i in start..end {
        if pivot_around_end && i == start {
            staging.prev_frames[cid] = geometry::rotate_frame(&rot, &chain.prev_frame(cid));
        } else {
            staging.frames[i] = geometry::rotate_frame(&rot, &chain.frame(i));
        }
    }

    // Propagate trial CA positions from the fixed anchor, then shrink the
    // window to the residues that actually moved.
    let mut w_start = start;
    let mut w_end = end;
    if !pivot_around_end {
        for i in start..end.saturating_sub(1) {
            let step = staging.frames[i].column(0) * CA_CA_DISTANCE;
            let ca = staging.residues[i].ca;
            staging.residues[i + 1].ca = ca + step;
        }
        if pivot_around_start {
            w_end -= 1;
        }
    } else {
        for i in (start + 1..end).rev() {
            let step = staging.frames[i].column(0) * CA_CA_DISTANCE;
            let ca = staging.residues[i + 1].ca;
            staging.residues[i].ca = ca - step;
        }
        w_start += 1;
    }

    // Rebuild the derived atoms of every touched residue, using the
    // chain-break-aware boundary frame where a residue opens a segment.
    for i in w_start..=w_end {
        let opens_segment = (pivot_around_end && i == w_start)
            || i == 1
            || chain.residue(i).chain != chain.residue(i - 1).chain;
        let prev = if opens_segment {
            staging.prev_frames[chain.residue(i).chain as usize]
        } else {
            staging.frames[i - 1]
        };
        let frame = staging.frames[i];
        staging.residues[i].rebuild_atoms(&prev, &frame);
    }

    trace!(
        start = w_start,
        end = w_end,
        ?class,
        alpha,
        "built trial segment"
    );

    MoveWindow {
        start: w_start,
        end: w_end,
        class,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::energy::CaContactModel;
    use crate::core::models::builder::ConformationBuilder;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn chain10() -> Conformation {
        ConformationBuilder::new("AGLVKEFTSI").build().unwrap()
    }

    #[test]
    fn classify_recognizes_the_terminal_pivots() {
        let chain = chain10();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            classify(&chain, 0, 3, &mut rng).unwrap(),
            MoveClass::PivotAroundEnd
        );
        assert_eq!(
            classify(&chain, 8, chain.naa(), &mut rng).unwrap(),
            MoveClass::PivotAroundStart
        );
        assert_eq!(
            classify(&chain, 3, 6, &mut rng).unwrap(),
            MoveClass::Crankshaft
        );
    }

    #[test]
    fn classify_resolves_windows_across_a_break_to_a_pivot() {
        let chain = ConformationBuilder::new("AGLVKE|FTSIMN").build().unwrap();
        let mut rng = StdRng::seed_from_u64(2);

        // Window [5, 8]: residues 5,6 on chain 0, 7,8 beyond the break.
        // start and start+1 share a chain, so the start side anchors.
        assert_eq!(
            classify(&chain, 5, 8, &mut rng).unwrap(),
            MoveClass::PivotAroundStart
        );
        // Window [6, 9]: start is the last residue of chain 0, end side is
        // contiguous on chain 1.
        assert_eq!(
            classify(&chain, 6, 9, &mut rng).unwrap(),
            MoveClass::PivotAroundEnd
        );
        // Two-residue window right at the break: either pivot, never a
        // crankshaft.
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let class = classify(&chain, 6, 7, &mut rng).unwrap();
            assert_ne!(class, MoveClass::Crankshaft);
        }
    }

    #[test]
    fn crankshaft_keeps_both_anchor_cas_fixed() {
        let chain = chain10();
        let mut staging = TrialStagingBuffer::new(&chain);
        staging.stage_step(&chain);
        let mut rng = StdRng::seed_from_u64(3);

        let window = build_trial(
            &chain,
            &mut staging,
            3,
            7,
            MoveClass::Crankshaft,
            0.8,
            &mut rng,
        );
        assert_eq!((window.start, window.end), (3, 7));

        assert_relative_eq!(
            (staging.residue(3).ca - chain.residue(3).ca).norm(),
            0.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            (staging.residue(7).ca - chain.residue(7).ca).norm(),
            0.0,
            epsilon = 1e-12
        );
        // Interior CAs keep their distance to both anchors (rigid rotation
        // about the anchor axis).
        for i in 4..7 {
            let before = (chain.residue(i).ca - chain.residue(3).ca).norm();
            let after = (staging.residue(i).ca - staging.residue(3).ca).norm();
            assert_relative_eq!(before, after, epsilon = 1e-9);
        }
    }

    #[test]
    fn crankshaft_preserves_backbone_bond_geometry() {
        let chain = chain10();
        let mut staging = TrialStagingBuffer::new(&chain);
        staging.stage_step(&chain);
        let mut rng = StdRng::seed_from_u64(4);

        let window = build_trial(
            &chain,
            &mut staging,
            2,
            6,
            MoveClass::Crankshaft,
            1.1,
            &mut rng,
        );

        for i in window.start..=window.end {
            let committed = chain.residue(i);
            let trial = staging.residue(i);
            assert_relative_eq!(
                (trial.n - trial.ca).norm(),
                (committed.n - committed.ca).norm(),
                epsilon = 1e-9
            );
            assert_relative_eq!(
                (trial.c - trial.ca).norm(),
                (committed.c - committed.ca).norm(),
                epsilon = 1e-9
            );
            assert_relative_eq!(
                (trial.o - trial.c).norm(),
                (committed.o - committed.c).norm(),
                epsilon = 1e-9
            );
        }
        for i in window.start..window.end {
            assert_relative_eq!(
                (staging.residue(i + 1).ca - staging.residue(i).ca).norm(),
                CA_CA_DISTANCE,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn end_pivot_moves_the_head_and_keeps_the_tail() {
        let chain = chain10();
        let mut staging = TrialStagingBuffer::new(&chain);
        staging.stage_step(&chain);
        let mut rng = StdRng::seed_from_u64(5);

        let window = build_trial(
            &chain,
            &mut staging,
            0,
            4,
            MoveClass::PivotAroundEnd,
            1.4,
            &mut rng,
        );
        // Start is adjusted inward: residue 0 is the sentinel.
        assert_eq!((window.start, window.end), (1, 4));

        // The end anchor CA is unchanged; some moved residue exists.
        assert_relative_eq!(
            (staging.residue(4).ca - chain.residue(4).ca).norm(),
            0.0,
            epsilon = 1e-12
        );
        let moved: f64 = (1..4)
            .map(|i| (staging.residue(i).ca - chain.residue(i).ca).norm())
            .sum();
        assert!(moved > 1e-6);
    }

    #[test]
    fn start_pivot_adjusts_the_window_end_inward() {
        let chain = chain10();
        let naa = chain.naa();
        let mut staging = TrialStagingBuffer::new(&chain);
        staging.stage_step(&chain);
        let mut rng = StdRng::seed_from_u64(6);

        let window = build_trial(
            &chain,
            &mut staging,
            7,
            naa,
            MoveClass::PivotAroundStart,
            1.4,
            &mut rng,
        );
        assert_eq!((window.start, window.end), (7, naa - 1));
        assert_relative_eq!(
            (staging.residue(7).ca - chain.residue(7).ca).norm(),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn resample_sidechains_only_touches_defined_dihedrals() {
        let chain = ConformationBuilder::new("GALVKEFTSI").build().unwrap();
        let model = CaContactModel::default();
        let config = SamplingConfig::default();
        let mut staging = TrialStagingBuffer::new(&chain);
        staging.stage_step(&chain);

        // Seed chosen so the 1/4 gate opens on the first draw.
        let mut resampled = false;
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            staging.stage_step(&chain);
            resample_sidechains(&chain, &mut staging, &config, &model, &mut rng);
            assert_eq!(staging.residue(1).chi1, None, "glycine gained a chi1");
            assert_eq!(staging.residue(2).chi1, None, "alanine gained a chi1");
            if staging.residue(3).chi1 != chain.residue(3).chi1 {
                resampled = true;
            }
        }
        assert!(resampled, "no seed opened the resampling gate");
    }

    #[test]
    fn fix_chi_angles_disables_resampling() {
        let chain = chain10();
        let model = CaContactModel::default();
        let config = SamplingConfig {
            fix_chi_angles: true,
            ..SamplingConfig::default()
        };
        let mut staging = TrialStagingBuffer::new(&chain);
        staging.stage_step(&chain);
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            resample_sidechains(&chain, &mut staging, &config, &model, &mut rng);
        }
        for i in 1..chain.naa() {
            assert_eq!(staging.residue(i).chi1, chain.residue(i).chi1);
        }
    }

    #[test]
    fn select_window_rejects_fixed_residues_inside_the_window() {
        // Lookup tables never produce such windows; feed one directly.
        let chain = ConformationBuilder::new("AGLVKEFTSI")
            .fix_residue(4)
            .build()
            .unwrap();
        let lookup = MoveLookupTable::build(&chain).unwrap();
        let config = SamplingConfig::default();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..512 {
            let (start, end) = select_window(&lookup, &chain, &config, &mut rng).unwrap();
            assert!(!(start..end).contains(&4), "window {start}..{end}");
        }
    }
}
