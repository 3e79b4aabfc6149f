use super::ion_set::{
    IonSet,
    TheoMz,
    NUM_SERIES,
};
use crate::chem;

#[derive(Debug, Clone, Copy)]
struct VarMod {
    residue: u8,
    mass: f64,
    /// Valid only on peptides participating in a cross-link.
    xl_only: bool,
    /// Mono-link masses derived from capped linkers.
    mono_link: bool,
}

#[derive(Debug, Clone, Copy)]
enum LinkShape {
    Full,
    Singlet(usize),
    Loop(usize, usize, f64),
}

/// Builds theoretical fragment-ion ladders for one peptide at a time.
///
/// One ladder instance is a worker scratchpad: `set_peptide` binds a peptide,
/// the `build_*` calls push the unmodified [`IonSet`] for the requested shape,
/// and the `mod_*_rec` calls enumerate every variable-modification combination
/// up to the configured cap, each as its own set.
#[derive(Debug, Clone)]
pub struct IonLadder {
    series_enabled: [bool; NUM_SERIES],
    /// Residue mass including fixed modifications.
    aa_mass: [f64; 128],
    nterm_fixed: f64,
    cterm_fixed: f64,
    var_mods: Vec<VarMod>,
    max_mods: usize,
    mono_links_on_xl: bool,
    diff_mods_on_xl: bool,

    seq: Vec<u8>,
    base_mass: f64,
    is_primary: bool,
    shape: LinkShape,
    sets: Vec<IonSet>,
}

impl IonLadder {
    pub fn new(series_enabled: [bool; NUM_SERIES]) -> Self {
        let mut aa_mass = [0.0; 128];
        for (aa, slot) in aa_mass.iter_mut().enumerate() {
            *slot = chem::residue_mass(aa as u8);
        }
        Self {
            series_enabled,
            aa_mass,
            nterm_fixed: 0.0,
            cterm_fixed: 0.0,
            var_mods: Vec::new(),
            max_mods: 0,
            mono_links_on_xl: false,
            diff_mods_on_xl: false,
            seq: Vec::new(),
            base_mass: 0.0,
            is_primary: true,
            shape: LinkShape::Full,
            sets: Vec::new(),
        }
    }

    /// Folds a fixed modification into the residue mass table. `n` and `c`
    /// address the peptide termini.
    pub fn add_fixed_mod(&mut self, residue: u8, mass: f64) {
        match residue {
            b'n' => self.nterm_fixed += mass,
            b'c' => self.cterm_fixed += mass,
            _ => self.aa_mass[residue as usize] += mass,
        }
    }

    pub fn add_mod(&mut self, residue: u8, xl_only: bool, mass: f64) {
        self.var_mods.push(VarMod {
            residue,
            mass,
            xl_only,
            mono_link: false,
        });
    }

    pub fn add_mono_link(&mut self, residue: u8, mass: f64) {
        self.var_mods.push(VarMod {
            residue,
            mass,
            xl_only: false,
            mono_link: true,
        });
    }

    pub fn set_max_mod_count(&mut self, max_mods: usize) {
        self.max_mods = max_mods;
    }

    pub fn set_mod_flags(&mut self, mono_links_on_xl: bool, diff_mods_on_xl: bool) {
        self.mono_links_on_xl = mono_links_on_xl;
        self.diff_mods_on_xl = diff_mods_on_xl;
    }

    /// Binds a peptide and clears any previously built sets.
    pub fn set_peptide(&mut self, is_primary: bool, seq: &[u8], base_mass: f64) {
        self.is_primary = is_primary;
        self.seq.clear();
        self.seq.extend_from_slice(seq);
        self.base_mass = base_mass;
        self.shape = LinkShape::Full;
        self.sets.clear();
    }

    pub fn reset(&mut self) {
        self.sets.clear();
    }

    /// Plain ladder, no link site.
    pub fn build_ions(&mut self) {
        self.shape = LinkShape::Full;
        self.push_set(&[]);
    }

    /// Ladder with one open link site at `k`.
    pub fn build_singlet_ions(&mut self, k: usize) {
        self.shape = LinkShape::Singlet(k);
        self.push_set(&[]);
    }

    /// Ladder for a loop-link joining `k1 < k2` through a linker of known mass.
    pub fn build_loop_ions(&mut self, linker_mass: f64, k1: usize, k2: usize) {
        debug_assert!(k1 < k2);
        self.shape = LinkShape::Loop(k1, k2, linker_mass);
        self.push_set(&[]);
    }

    /// Enumerates variable-modification combinations for the current full or
    /// singlet shape, appending one set per combination.
    pub fn mod_ions_rec(&mut self) {
        let mut pending = Vec::new();
        self.recurse(0, &mut pending);
    }

    /// Loop-shape counterpart of [`Self::mod_ions_rec`].
    pub fn mod_loop_ions_rec(&mut self) {
        let mut pending = Vec::new();
        self.recurse(0, &mut pending);
    }

    pub fn size(&self) -> usize {
        self.sets.len()
    }

    pub fn at(&self, index: usize) -> &IonSet {
        &self.sets[index]
    }

    pub fn ion_count(&self) -> usize {
        self.seq.len().saturating_sub(1)
    }

    pub fn peptide_len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    fn recurse(&mut self, start: usize, pending: &mut Vec<(usize, f64)>) {
        if self.max_mods == 0 {
            return;
        }
        for pos in start..self.seq.len() {
            for mi in 0..self.var_mods.len() {
                let vm = self.var_mods[mi];
                if vm.residue != self.seq[pos] {
                    continue;
                }
                if !self.placeable(vm, pos) {
                    continue;
                }
                pending.push((pos, vm.mass));
                self.push_set(pending);
                if pending.len() < self.max_mods {
                    self.recurse(pos + 1, pending);
                }
                pending.pop();
            }
        }
    }

    fn placeable(&self, vm: VarMod, pos: usize) -> bool {
        let (linked, on_site) = match self.shape {
            LinkShape::Full => (false, false),
            LinkShape::Singlet(k) => (true, pos == k),
            LinkShape::Loop(k1, k2, _) => (true, pos == k1 || pos == k2),
        };
        if vm.mono_link {
            // A mono-link caps a site; it never sits on an open link site and
            // joins a cross-linked peptide only when configured to.
            if on_site {
                return false;
            }
            if linked && !self.mono_links_on_xl {
                return false;
            }
            return true;
        }
        if vm.xl_only && !linked {
            return false;
        }
        if on_site && !self.diff_mods_on_xl {
            return false;
        }
        true
    }

    fn push_set(&mut self, pending: &[(usize, f64)]) {
        let len = self.seq.len();
        let n = len.saturating_sub(1);

        let mut mods = vec![0.0; len];
        for &(pos, mass) in pending {
            mods[pos] += mass;
        }
        let dif_mass: f64 = pending.iter().map(|x| x.1).sum();

        // prefix[i]: residues 0..=i with mods plus the fixed N-terminal mass.
        let mut prefix = Vec::with_capacity(n);
        let mut run = self.nterm_fixed;
        for i in 0..n {
            run += self.aa_mass[self.seq[i] as usize] + mods[i];
            prefix.push(run);
        }
        let total_residues = if len > 0 {
            run + self.aa_mass[self.seq[len - 1] as usize] + mods[len - 1] + self.cterm_fixed
        } else {
            0.0
        };

        let mut series: [Vec<TheoMz>; NUM_SERIES] = Default::default();
        for i in 0..n {
            let nterm_neutral = prefix[i];
            let cterm_neutral = total_residues - prefix[n - 1 - i] + chem::MASS_WATER;

            // The N-terminal fragment at index i covers residues 0..=i; the
            // C-terminal one covers the last i+1 residues.
            let (n_open, n_extra) = match self.shape {
                LinkShape::Full => (false, 0.0),
                LinkShape::Singlet(k) => (k <= i, 0.0),
                LinkShape::Loop(k1, k2, lm) => {
                    if i < k1 {
                        (false, 0.0)
                    } else if i < k2 {
                        (true, 0.0)
                    } else {
                        (false, lm)
                    }
                }
            };
            let first_covered = len - 1 - i;
            let (c_open, c_extra) = match self.shape {
                LinkShape::Full => (false, 0.0),
                LinkShape::Singlet(k) => (k >= first_covered, 0.0),
                LinkShape::Loop(k1, k2, lm) => {
                    if first_covered > k2 {
                        (false, 0.0)
                    } else if first_covered > k1 {
                        (true, 0.0)
                    } else {
                        (false, lm)
                    }
                }
            };

            let n_variants = [
                nterm_neutral - chem::MASS_CO,
                nterm_neutral,
                nterm_neutral + chem::MASS_NH3,
            ];
            let c_variants = [
                cterm_neutral + chem::MASS_CO - chem::MASS_H2,
                cterm_neutral,
                cterm_neutral - chem::MASS_NH2,
            ];
            for (v, &neutral) in n_variants.iter().enumerate() {
                if self.series_enabled[v] {
                    series[v].push(theo(neutral + n_extra, n_open));
                }
            }
            for (v, &neutral) in c_variants.iter().enumerate() {
                if self.series_enabled[v + 3] {
                    series[v + 3].push(theo(neutral + c_extra, c_open));
                }
            }
        }

        let shape_mass = match self.shape {
            LinkShape::Loop(_, _, lm) => lm,
            _ => 0.0,
        };
        self.sets.push(IonSet {
            mass: self.base_mass + dif_mass + shape_mass,
            dif_mass,
            mods,
            series,
        });
    }
}

fn theo(neutral: f64, open: bool) -> TheoMz {
    if open {
        TheoMz::Open(neutral)
    } else {
        TheoMz::Fixed(neutral)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BY: [bool; NUM_SERIES] = [false, true, false, false, true, false];

    fn ladder(seq: &[u8]) -> IonLadder {
        let mut l = IonLadder::new(BY);
        l.set_peptide(true, seq, chem::peptide_neutral_mass(seq));
        l
    }

    #[test]
    fn test_full_ladder_masses() {
        let mut l = ladder(b"PEPTIDE");
        l.build_ions();
        assert_eq!(l.size(), 1);
        let set = l.at(0);
        assert_eq!(set.ion_count(), 6);

        // b1 is the first residue, y1 the last plus water.
        let b = &set.series[1];
        let y = &set.series[4];
        assert!((b[0].neutral() - chem::residue_mass(b'P')).abs() < 1e-9);
        assert!(
            (y[0].neutral() - (chem::residue_mass(b'E') + chem::MASS_WATER)).abs() < 1e-9
        );
        // Complementary pairs sum to the peptide mass.
        for i in 0..6 {
            let sum = b[i].neutral() + y[5 - i].neutral();
            assert!((sum - set.mass).abs() < 1e-9, "pair {} sums to {}", i, sum);
        }
        // Without a link site nothing is open.
        assert!(b.iter().chain(y.iter()).all(|x| !x.is_open()));
    }

    #[test]
    fn test_singlet_ladder_open_classification() {
        let mut l = ladder(b"PEPTIDE");
        l.build_singlet_ions(2);
        let set = l.at(0);
        let b = &set.series[1];
        let y = &set.series[4];
        // b fragments covering position 2 are open.
        let b_open: Vec<bool> = b.iter().map(|x| x.is_open()).collect();
        assert_eq!(b_open, vec![false, false, true, true, true, true]);
        // y fragment i covers the last i+1 residues; position 2 enters at i=4.
        let y_open: Vec<bool> = y.iter().map(|x| x.is_open()).collect();
        assert_eq!(y_open, vec![false, false, false, false, true, true]);
    }

    #[test]
    fn test_loop_ladder_spans_and_mass() {
        let lm = 138.0680796;
        let mut l = ladder(b"PEPTIDE");
        l.build_loop_ions(lm, 1, 4);
        let set = l.at(0);
        // Precursor matching for a loop includes the linker.
        assert!((set.mass - (chem::peptide_neutral_mass(b"PEPTIDE") + lm)).abs() < 1e-9);

        let b = &set.series[1];
        // Before k1: plain. Between the sites: open. Enclosing both: +linker.
        assert_eq!(b[0], TheoMz::Fixed(chem::residue_mass(b'P')));
        assert!(b[1].is_open() && b[2].is_open() && b[3].is_open());
        assert!(!b[4].is_open());
        let enclosed = chem::residue_mass(b'P') * 2.0
            + chem::residue_mass(b'E')
            + chem::residue_mass(b'T')
            + chem::residue_mass(b'I')
            + lm;
        assert!((b[4].neutral() - enclosed).abs() < 1e-9);

        let y = &set.series[4];
        // y1, y2 start past k2=4: plain. y3..y5 cover k2 only: open. y6 covers
        // both sites and carries the linker.
        let y_open: Vec<bool> = y.iter().map(|x| x.is_open()).collect();
        assert_eq!(y_open, vec![false, false, true, true, true, false]);
        assert!(y[5].neutral() > chem::peptide_neutral_mass(b"EPTIDE"));
    }

    #[test]
    fn test_mod_enumeration_combinations() {
        let mut l = IonLadder::new(BY);
        l.add_mod(b'K', false, 42.010565);
        l.set_max_mod_count(2);
        l.set_peptide(true, b"AKAKA", chem::peptide_neutral_mass(b"AKAKA"));
        l.build_ions();
        l.mod_ions_rec();
        // Unmodified, K2, K4, K2+K4.
        assert_eq!(l.size(), 4);
        let difs: Vec<f64> = (0..l.size()).map(|i| l.at(i).dif_mass).collect();
        assert!((difs[0] - 0.0).abs() < 1e-9);
        assert!((difs[3] - 84.02113).abs() < 1e-4);
        // The set mass tracks the placed mods.
        assert!((l.at(3).mass - (l.at(0).mass + 84.02113)).abs() < 1e-4);
    }

    #[test]
    fn test_max_mods_caps_enumeration() {
        let mut l = IonLadder::new(BY);
        l.add_mod(b'K', false, 42.0);
        l.set_max_mod_count(1);
        l.set_peptide(true, b"AKAKA", chem::peptide_neutral_mass(b"AKAKA"));
        l.build_ions();
        l.mod_ions_rec();
        assert_eq!(l.size(), 3);
    }

    #[test]
    fn test_link_site_blocks_mods_by_default() {
        let mut l = IonLadder::new(BY);
        l.add_mod(b'K', false, 42.0);
        l.set_max_mod_count(2);
        l.set_peptide(true, b"AKAKA", chem::peptide_neutral_mass(b"AKAKA"));
        l.build_singlet_ions(1);
        l.mod_ions_rec();
        // Only K4 is moddable while K2 carries the open link.
        assert_eq!(l.size(), 2);

        l.set_mod_flags(false, true);
        l.reset();
        l.build_singlet_ions(1);
        l.mod_ions_rec();
        assert_eq!(l.size(), 4);
    }

    #[test]
    fn test_xl_only_mods_need_link_context() {
        let mut l = IonLadder::new(BY);
        l.add_mod(b'K', true, 42.0);
        l.set_max_mod_count(2);
        l.set_peptide(true, b"AKA", chem::peptide_neutral_mass(b"AKA"));
        l.build_ions();
        l.mod_ions_rec();
        assert_eq!(l.size(), 1);

        l.reset();
        l.build_singlet_ions(0);
        l.mod_ions_rec();
        assert_eq!(l.size(), 2);
    }

    #[test]
    fn test_mono_links_gated_on_crosslinked_peptides() {
        let mut l = IonLadder::new(BY);
        l.add_mono_link(b'K', 156.0786);
        l.set_max_mod_count(2);
        l.set_peptide(true, b"AKAKA", chem::peptide_neutral_mass(b"AKAKA"));
        l.build_ions();
        l.mod_ions_rec();
        // Mono-links enumerate freely in the full search.
        assert_eq!(l.size(), 4);

        l.reset();
        l.build_singlet_ions(1);
        l.mod_ions_rec();
        assert_eq!(l.size(), 1);

        l.set_mod_flags(true, false);
        l.reset();
        l.build_singlet_ions(1);
        l.mod_ions_rec();
        // Allowed everywhere but on the open site itself.
        assert_eq!(l.size(), 2);
    }

    #[test]
    fn test_rebuild_is_independent_of_prior_state() {
        let mut l = IonLadder::new(BY);
        l.add_mod(b'K', false, 42.0);
        l.set_max_mod_count(2);
        l.set_peptide(true, b"AKAKA", chem::peptide_neutral_mass(b"AKAKA"));
        l.build_ions();
        l.mod_ions_rec();
        let first = l.size();

        l.reset();
        l.build_ions();
        l.mod_ions_rec();
        assert_eq!(l.size(), first);

        // Re-binding a peptide clears sets as well.
        l.set_peptide(true, b"SAMPLER", chem::peptide_neutral_mass(b"SAMPLER"));
        l.build_ions();
        assert_eq!(l.size(), 1);
    }

    #[test]
    fn test_fixed_mods_shift_fragments() {
        let mut l = IonLadder::new(BY);
        l.add_fixed_mod(b'C', 57.021464);
        let mass = chem::peptide_neutral_mass(b"ACE") + 57.021464;
        l.set_peptide(true, b"ACE", mass);
        l.build_ions();
        let set = l.at(0);
        let b2 = set.series[1][1].neutral();
        let expected = chem::residue_mass(b'A') + chem::residue_mass(b'C') + 57.021464;
        assert!((b2 - expected).abs() < 1e-9);
    }
}
