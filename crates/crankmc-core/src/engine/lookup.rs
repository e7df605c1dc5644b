use super::error::EngineError;
use crate::core::models::chain::Conformation;
use tracing::{debug, info};

/// Number of segment-length classes: windows span 1 to 4 backbone bonds,
/// stored by `length = bonds - 1`.
pub const LENGTH_CLASSES: usize = 4;

/// Sentinel marking unused slots in a length-class row.
const UNUSED_SLOT: i32 = -1;

/// Precomputed table of legal move-start indices per segment length.
///
/// Built once from the chain topology (chain breaks and FIXED flags) during
/// simulation setup and immutable afterwards. A start index of `j` stands
/// for the window `[j, j + length + 1]`; the extra `j - 1` entries at chain
/// beginnings encode pivots anchored outside the chain.
#[derive(Debug, Clone)]
pub struct MoveLookupTable {
    rows: [Vec<i32>; LENGTH_CLASSES],
    legal: [usize; LENGTH_CLASSES],
}

impl MoveLookupTable {
    /// Enumerates every legal move window and verifies the coverage
    /// invariant `legal + fixed_disallowed == (naa-1) + (1-length)*nchains`
    /// for each length class. A mismatch means the topology or constraint
    /// flags are inconsistent and is fatal.
    pub fn build(chain: &Conformation) -> Result<Self, EngineError> {
        let naa = chain.naa();
        let nchains = chain.nchains();
        if naa < 3 || nchains == 0 {
            return Err(EngineError::Topology(format!(
                "need at least two residues and one chain, got naa={naa}, nchains={nchains}"
            )));
        }

        info!(
            sequence = %chain.sequence_string(),
            nchains,
            "building move lookup table"
        );

        let width = naa - 1 + nchains;
        let mut rows: [Vec<i32>; LENGTH_CLASSES] = Default::default();
        let mut legal = [0usize; LENGTH_CLASSES];

        for length in 0..LENGTH_CLASSES {
            let mut row = Vec::with_capacity(width);
            let mut fixed_disallowed = 0usize;

            for j in 1..naa.saturating_sub(length) {
                let window_end = j + length;
                let in_chain = chain.residue(j).chain == chain.residue(window_end).chain;
                let chain_start =
                    j == 1 || chain.residue(j).chain != chain.residue(j - 1).chain;

                let any_fixed = (j..=window_end).any(|k| {
                    chain.residue(k).flags.fixed
                        && chain.residue(k).chain == chain.residue(j).chain
                });

                if any_fixed {
                    if in_chain {
                        fixed_disallowed += 1;
                        // The boundary pivot at a chain beginning is lost too.
                        if chain_start {
                            fixed_disallowed += 1;
                        }
                    }
                    continue;
                }

                if in_chain {
                    if chain_start {
                        row.push(j as i32 - 1);
                    }
                    row.push(j as i32);
                }
            }

            let theoretical =
                (naa as isize - 1) + (1 - length as isize) * nchains as isize;
            if row.len() as isize + fixed_disallowed as isize != theoretical {
                return Err(EngineError::MoveCountMismatch {
                    length,
                    legal: row.len(),
                    fixed_disallowed,
                    theoretical: theoretical.max(0) as usize,
                });
            }

            legal[length] = row.len();
            row.resize(width, UNUSED_SLOT);
            debug!(
                length,
                legal = legal[length],
                fixed_disallowed,
                "enumerated move starts"
            );
            rows[length] = row;
        }

        Ok(Self { rows, legal })
    }

    /// Number of legal windows for a length class.
    pub fn legal_count(&self, length: usize) -> usize {
        self.legal[length]
    }

    /// Maps one random integer to `(length, start)` exactly the way the
    /// sampler consumes it: the two low bits select the length class, the
    /// remaining bits select a slot among the legal entries.
    pub fn sample(&self, toss: u32, naa: usize) -> Result<(usize, usize), EngineError> {
        let mut length = (toss & 0x3) as usize;
        if length > naa - 2 {
            length = naa - 2;
        }

        let n_len = self.legal[length];
        if n_len == 0 {
            return Err(EngineError::Topology(format!(
                "no legal moves for segment length {length}"
            )));
        }
        let slot = (toss >> 2) as usize % n_len;

        let start = self.rows[length][slot];
        if start < 0 {
            return Err(EngineError::SentinelMove { length, slot });
        }
        Ok((length, start as usize))
    }

    #[cfg(test)]
    fn starts(&self, length: usize) -> &[i32] {
        &self.rows[length]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::ConformationBuilder;

    fn single_chain(n: usize) -> Conformation {
        let seq: String = "AGLVKEFTSIMN".chars().cycle().take(n).collect();
        ConformationBuilder::new(&seq).build().unwrap()
    }

    #[test]
    fn coverage_invariant_holds_for_a_single_chain() {
        let chain = single_chain(10);
        let table = MoveLookupTable::build(&chain).unwrap();
        let naa = chain.naa();
        for length in 0..LENGTH_CLASSES {
            // No fixed residues: every theoretical window must be legal.
            let theoretical = (naa as isize - 1 + (1 - length as isize)) as usize;
            assert_eq!(table.legal_count(length), theoretical, "length {length}");
        }
    }

    #[test]
    fn rows_are_sentinel_padded_to_full_width() {
        let chain = single_chain(10);
        let table = MoveLookupTable::build(&chain).unwrap();
        let width = chain.naa() - 1 + chain.nchains();
        for length in 0..LENGTH_CLASSES {
            assert_eq!(table.starts(length).len(), width);
            for &slot in &table.starts(length)[table.legal_count(length)..] {
                assert_eq!(slot, -1);
            }
        }
    }

    #[test]
    fn chain_beginnings_get_the_extra_boundary_move() {
        let chain = single_chain(6);
        let table = MoveLookupTable::build(&chain).unwrap();
        // Length 0: starts 0 (boundary pivot) plus 1..=6.
        assert_eq!(&table.starts(0)[..table.legal_count(0)], &[0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn no_window_spans_a_chain_break() {
        // Two chains, break after residue 6 of 12.
        let chain = ConformationBuilder::new("AGLVKE|FTSIMN").build().unwrap();
        let table = MoveLookupTable::build(&chain).unwrap();

        let naa = chain.naa();
        for length in 0..LENGTH_CLASSES {
            for &start in &table.starts(length)[..table.legal_count(length)] {
                let v = start as usize;
                if start == 0
                    || (v + 1 < naa && chain.residue(v).chain != chain.residue(v + 1).chain)
                {
                    // Boundary entry: a pivot anchored at a chain start.
                    continue;
                }
                assert!(v + length < naa);
                for k in v..=v + length {
                    assert_eq!(
                        chain.residue(k).chain,
                        chain.residue(v).chain,
                        "window [{v},{}] straddles the break",
                        v + length
                    );
                }
            }
        }

        // Coverage invariant with two chains.
        let naa = chain.naa() as isize;
        for length in 0..LENGTH_CLASSES {
            let theoretical = (naa - 1) + (1 - length as isize) * 2;
            assert_eq!(table.legal_count(length) as isize, theoretical);
        }
    }

    #[test]
    fn fixed_residues_are_excluded_but_counted() {
        let chain = ConformationBuilder::new("AGLVKEFTSI")
            .fix_residue(5)
            .build()
            .unwrap();
        let table = MoveLookupTable::build(&chain).unwrap();

        for length in 0..LENGTH_CLASSES {
            for &start in &table.starts(length)[..table.legal_count(length)] {
                let j = (start as usize).max(1);
                for k in j..=(start as usize + length) {
                    assert!(
                        !chain.residue(k).flags.fixed,
                        "length {length} window starting {start} touches the fixed residue"
                    );
                }
            }
            // Build succeeded, so legal + fixed_disallowed matched the
            // theoretical count; legal must have shrunk.
            let naa = chain.naa() as isize;
            let theoretical = ((naa - 1) + (1 - length as isize)) as usize;
            assert!(table.legal_count(length) < theoretical);
        }
    }

    #[test]
    fn sample_maps_toss_to_length_and_start() {
        let chain = single_chain(10);
        let table = MoveLookupTable::build(&chain).unwrap();

        // toss = 0b...001: length 1, slot 0 -> boundary start 0.
        let (length, start) = table.sample(1, chain.naa()).unwrap();
        assert_eq!(length, 1);
        assert_eq!(start, 0);

        // Slot selection wraps modulo the legal count.
        let legal = table.legal_count(2) as u32;
        let (length, start) = table.sample(2 | ((legal + 1) << 2), chain.naa()).unwrap();
        assert_eq!(length, 2);
        assert_eq!(start as i32, table.starts(2)[1]);
    }

    #[test]
    fn build_rejects_chains_that_are_too_short() {
        let chain = ConformationBuilder::new("AG").build().unwrap();
        // One residue window classes cannot satisfy the invariant.
        assert!(MoveLookupTable::build(&chain).is_err());
    }
}
