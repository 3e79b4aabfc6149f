use super::scratch::ScratchPool;
use crate::config::{
    ScoreKernel,
    SearchConfig,
};
use crate::errors::{
    LinkSeekError,
    Result,
};
use crate::fragment_ions::{
    IonLadder,
    IonSet,
    NUM_SERIES,
};
use crate::linkers::LinkerTable;
use crate::models::{
    LinkKind,
    Peptide,
    PepMod,
    ScoreCard,
    SingletScoreCard,
    Spectrum,
    SpectrumSet,
};
use crate::scoring::{
    kojak_score,
    xcorr_score,
};
use crate::traits::PeptideDatabase;
use rayon::prelude::*;
use std::time::Instant;
use tracing::info;

/// The shared analysis context: configuration, collaborators, and the worker
/// scratchpads for both stages.
///
/// Everything it borrows is immutable during analysis except the per-spectrum
/// match tables, which [`SpectrumSet`] guards with one mutex per spectrum.
pub struct SearchEngine<'a, D: PeptideDatabase> {
    pub(super) config: &'a SearchConfig,
    pub(super) db: &'a D,
    pub(super) spectra: &'a SpectrumSet,
    pub(super) linkers: &'a LinkerTable,
    pub(super) scratch: ScratchPool,
    pub(super) pool: rayon::ThreadPool,
    pub(super) series: [bool; NUM_SERIES],
    min_mass: f64,
    max_mass: f64,
}

impl<'a, D: PeptideDatabase> SearchEngine<'a, D> {
    pub fn new(
        config: &'a SearchConfig,
        db: &'a D,
        spectra: &'a SpectrumSet,
        linkers: &'a LinkerTable,
    ) -> Result<Self> {
        let series = config.ion_series.as_flags();

        let mut template = IonLadder::new(series);
        for m in &config.fixed_mods {
            template.add_fixed_mod(m.residue as u8, m.mass);
        }
        for m in &config.variable_mods {
            template.add_mod(m.residue as u8, m.xl_only, m.mass);
        }
        for linker in linkers.linkers() {
            if !linker.is_mono {
                continue;
            }
            for symbol in linker.site_a.bytes() {
                // Terminus pseudo-residues never appear in sequences.
                if symbol != b'n' && symbol != b'c' {
                    template.add_mono_link(symbol, linker.mass);
                }
            }
        }
        template.set_max_mod_count(config.max_mods);
        template.set_mod_flags(config.mono_links_on_xl, config.diff_mods_on_xl);

        let threads = config.threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| LinkSeekError::ThreadPool { msg: e.to_string() })?;

        let (min_mass, max_mass) = if spectra.is_empty() {
            (0.0, 0.0)
        } else {
            (
                spectra.min_precursor_mass() - 0.25,
                spectra.max_precursor_mass() + 0.25,
            )
        };

        Ok(Self {
            config,
            db,
            spectra,
            linkers,
            scratch: ScratchPool::new(threads, &template),
            pool,
            series,
            min_mass,
            max_mass,
        })
    }

    /// Stage 1: scores single peptides and loop-links against all spectra in
    /// precursor tolerance and, when cross-linking, accumulates singlets.
    pub fn analyze_peptides(&self, cross_link: bool) -> Result<()> {
        let peptides = self.db.peptide_list(cross_link);
        // Sorted by mass: everything past max_mass can never match, and plain
        // peptides below min_mass cannot either. Cross-linkable peptides keep
        // their low end since the singlet window reaches above the peptide.
        let end = peptides.partition_point(|p| p.mass <= self.max_mass);
        let start = if cross_link {
            0
        } else {
            peptides.partition_point(|p| p.mass < self.min_mass)
        };

        let t0 = Instant::now();
        self.pool.install(|| {
            peptides[start..end]
                .par_iter()
                .enumerate()
                .for_each(|(offset, peptide)| {
                    let mut ions = self.scratch.claim();
                    self.analyze_peptide(&mut ions, peptide, start + offset, cross_link);
                });
        });
        info!(
            "Peptide analysis (cross_link={}) of {} peptides took {:?}",
            cross_link,
            end - start,
            t0.elapsed()
        );
        Ok(())
    }

    fn analyze_peptide(
        &self,
        ions: &mut IonLadder,
        peptide: &Peptide,
        pep_index: usize,
        cross_link: bool,
    ) {
        let seq = self.db.peptide_seq(peptide);
        ions.set_peptide(true, seq, peptide.mass);
        ions.build_ions();
        ions.mod_ions_rec();

        for j in 0..ions.size() {
            let matched = self
                .spectra
                .boundaries_ppm(ions.at(j).mass, self.config.ppm_precursor);
            if !matched.is_empty() {
                self.score_spectra(
                    ions,
                    j,
                    cross_link,
                    pep_index,
                    None,
                    None,
                    LinkKind::None,
                    &matched,
                );
            }
            if self.config.dimers_nc {
                self.analyze_singlets_no_site(&*ions, j, peptide, pep_index, cross_link);
            }
        }

        if !cross_link {
            return;
        }

        self.analyze_singlets(ions, peptide, pep_index);
        self.analyze_loop_links(ions, peptide, pep_index);
    }

    /// Accumulates singlet candidates for every eligible link site.
    fn analyze_singlets(&self, ions: &mut IonLadder, peptide: &Peptide, pep_index: usize) {
        let seq = self.db.peptide_seq(peptide);
        let len = seq.len();

        let mut window_min =
            peptide.mass + self.linkers.low_link_mass() + self.config.min_pep_mass;
        let mut window_max =
            peptide.mass + self.linkers.high_link_mass() + self.config.max_pep_mass;
        window_min -= window_min / 1e6 * self.config.ppm_precursor;
        window_max += window_max / 1e6 * self.config.ppm_precursor;

        ions.set_peptide(true, seq, peptide.mass);

        for k in 0..len {
            if k == len - 1 {
                // Only a protein C terminus with a `c` motif keeps the last
                // residue in play.
                if !(peptide.c_term && !self.linkers.motifs_for(b'c').is_empty()) {
                    continue;
                }
            } else if self.linkers.motifs_for(seq[k]).is_empty() {
                if !(k == 0 && peptide.n_term && !self.linkers.motifs_for(b'n').is_empty()) {
                    continue;
                }
            }

            ions.reset();
            ions.build_singlet_ions(k);
            ions.mod_ions_rec();

            for i in 0..ions.size() {
                let dif = ions.at(i).dif_mass;
                let matched = self.spectra.boundaries(window_min + dif, window_max + dif);
                for &spec_index in &matched {
                    self.score_singlet_spectra(
                        ions,
                        i,
                        spec_index,
                        len,
                        pep_index,
                        Some(k as u8),
                        true,
                        window_min,
                    );
                }
            }
        }
    }

    /// Site-less singlets feeding the non-covalent dimer pass of stage 3.
    fn analyze_singlets_no_site(
        &self,
        ions: &IonLadder,
        set_index: usize,
        peptide: &Peptide,
        pep_index: usize,
        cross_link: bool,
    ) {
        let dif = ions.at(set_index).dif_mass;
        let mut window_min = peptide.mass + dif + self.config.min_pep_mass;
        let mut window_max = peptide.mass + dif + self.config.max_pep_mass;
        window_min -= window_min / 1e6 * self.config.ppm_precursor;
        window_max += window_max / 1e6 * self.config.ppm_precursor;

        let matched = self.spectra.boundaries(window_min, window_max);
        for &spec_index in &matched {
            self.score_singlet_spectra(
                ions,
                set_index,
                spec_index,
                peptide.len(),
                pep_index,
                None,
                cross_link,
                window_min,
            );
        }
    }

    /// Dispatches one full or loop ion set against the matched spectra.
    #[allow(clippy::too_many_arguments)]
    fn score_spectra(
        &self,
        ions: &IonLadder,
        set_index: usize,
        cross_link: bool,
        pep_index: usize,
        k1: Option<u8>,
        k2: Option<u8>,
        link: LinkKind,
        matched: &[usize],
    ) {
        let set = ions.at(set_index);
        for &spec_index in matched {
            let spectrum = self.spectra.spectrum(spec_index);
            let score = self.kernel_score(spectrum, set, 0.0);
            let card = ScoreCard {
                simple_score: score,
                score1: 0.0,
                score2: 0.0,
                mass: set.mass,
                mass1: 0.0,
                mass2: 0.0,
                pep1: pep_index,
                pep2: None,
                k1,
                k2,
                link,
                linkable1: cross_link,
                linkable2: cross_link,
                rank1: 0,
                rank2: 0,
                mods1: placed_mods(set),
                mods2: Vec::new(),
            };
            self.spectra.check_score(spec_index, card);
        }
    }

    /// Scores one singlet ion set against one spectrum: best kernel score over
    /// the spectrum's qualifying precursors, normalized by peptide length.
    #[allow(clippy::too_many_arguments)]
    fn score_singlet_spectra(
        &self,
        ions: &IonLadder,
        set_index: usize,
        spec_index: usize,
        len: usize,
        pep_index: usize,
        k1: Option<u8>,
        linkable: bool,
        window_min: f64,
    ) {
        let spectrum = self.spectra.spectrum(spec_index);
        let set = ions.at(set_index);

        let mut best = 0.0f32;
        for precursor in &spectrum.precursors {
            if precursor.mono_mass > window_min {
                let score = self.kernel_score(spectrum, set, precursor.mono_mass - set.mass);
                if score > best {
                    best = score;
                }
            }
        }

        let simple_score = best / len as f32;
        if simple_score > 0.0 {
            let card = SingletScoreCard {
                pep: pep_index,
                k1,
                linkable,
                len,
                mass: set.mass,
                simple_score,
                mods: placed_mods(set),
            };
            self.spectra.check_singlet_score(spec_index, card);
        }
    }

    /// Enumerates intra-peptide loop-links over all motif-compatible site
    /// pairs; the last residue never hosts the second site.
    fn analyze_loop_links(&self, ions: &mut IonLadder, peptide: &Peptide, pep_index: usize) {
        let seq = self.db.peptide_seq(peptide);
        for k in 0..seq.len() {
            for &motif in self.linkers.motifs_for(seq[k]) {
                for &(counter, xl_index) in self.linkers.counter_motifs(motif) {
                    for k2 in (k + 1)..(seq.len() - 1) {
                        if !self.linkers.motifs_for(seq[k2]).contains(&counter) {
                            continue;
                        }
                        let linker_mass = self.linkers.linker(xl_index).mass;
                        ions.reset();
                        ions.build_loop_ions(linker_mass, k, k2);
                        ions.mod_loop_ions_rec();
                        for j in 0..ions.size() {
                            let matched = self
                                .spectra
                                .boundaries_ppm(ions.at(j).mass, self.config.ppm_precursor);
                            if !matched.is_empty() {
                                self.score_spectra(
                                    ions,
                                    j,
                                    true,
                                    pep_index,
                                    Some(k as u8),
                                    Some(k2 as u8),
                                    LinkKind::Linker(xl_index),
                                    &matched,
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    pub(super) fn kernel_score(&self, spectrum: &Spectrum, set: &IonSet, offset: f64) -> f32 {
        match self.config.kernel {
            ScoreKernel::XCorr => xcorr_score(spectrum, set, offset, self.series),
            ScoreKernel::Kojak => kojak_score(spectrum, set, offset, self.series),
        }
    }
}

/// Collects the per-position mod masses of a set into sparse card form.
pub(super) fn placed_mods(set: &IonSet) -> Vec<PepMod> {
    if set.dif_mass == 0.0 {
        return Vec::new();
    }
    set.mods
        .iter()
        .enumerate()
        .filter(|(_, &mass)| mass != 0.0)
        .map(|(pos, &mass)| PepMod {
            pos: pos as u8,
            mass,
        })
        .collect()
}
