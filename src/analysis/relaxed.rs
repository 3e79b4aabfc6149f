use super::engine::SearchEngine;
use crate::diagnostics;
use crate::errors::Result;
use crate::fragment_ions::IonLadder;
use crate::models::{
    LinkKind,
    Precursor,
    ScoreCard,
    SingletScoreCard,
    Spectrum,
};
use crate::scoring::{
    set_bin_list,
    shared_score,
    BinList,
};
use crate::traits::PeptideDatabase;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::time::Instant;
use tracing::{
    info,
    trace,
    warn,
};

/// Signed precursor mass error in parts per million.
pub fn ppm_error(total_mass: f64, precursor_mass: f64) -> f64 {
    (total_mass - precursor_mass) / precursor_mass * 1e6
}

/// The tolerance window is closed on both sides: a candidate exactly at the
/// boundary is accepted.
pub fn within_tolerance(ppm: f64, tolerance: f64) -> bool {
    !(ppm < -tolerance) && !(ppm > tolerance)
}

/// A singlet annotated for pairing: motifs of its link site (with terminus
/// promotion) and its position in the stored table.
#[derive(Debug, Clone)]
struct SingletSummary {
    len: usize,
    k1: Option<u8>,
    linkable: bool,
    pep: usize,
    rank: usize,
    score: f32,
    /// Zero for zero-score cards so they sort to the front and are skipped.
    mass: f64,
    motifs: Vec<usize>,
    /// 1 target-only, 0 decoy-only, 2 mixed.
    target: u8,
}

impl<'a, D: PeptideDatabase> SearchEngine<'a, D> {
    /// Stage 3: per spectrum, pairs accumulated singlets into cross-links
    /// (and non-covalent dimers when enabled).
    pub fn analyze_relaxed(&self) -> Result<()> {
        let t0 = Instant::now();
        self.pool.install(|| {
            (0..self.spectra.len()).into_par_iter().for_each(|index| {
                let mut ions = self.scratch.claim();
                self.relaxed_spectrum(index, &mut ions);
            });
        });
        info!(
            "Relaxed pairing of {} spectra took {:?}",
            self.spectra.len(),
            t0.elapsed()
        );
        Ok(())
    }

    fn relaxed_spectrum(&self, spec_index: usize, ions: &mut IonLadder) {
        let spectrum = self.spectra.spectrum(spec_index);
        let snapshot = self.spectra.snapshot_singlets(spec_index);

        if self.config.diag_scans.contains(&spectrum.scan_number) {
            if let Err(e) = diagnostics::write_singlet_table(
                &self.config.diag_dir,
                spectrum.scan_number,
                &snapshot,
                self.db,
            ) {
                warn!(
                    "failed to write diagnostic table for scan {}: {}",
                    spectrum.scan_number, e
                );
            }
        }

        if snapshot.is_empty() {
            return;
        }

        let mut s: Vec<SingletSummary> = snapshot
            .iter()
            .enumerate()
            .map(|(rank, card)| self.summarize(card, rank))
            .collect();
        s.sort_by(|a, b| a.mass.partial_cmp(&b.mass).unwrap_or(Ordering::Equal));

        self.cross_link_pass(spec_index, spectrum, ions, &mut s, &snapshot);
        for card in s.iter_mut() {
            if card.score < 0.0 {
                card.score = -card.score;
            }
        }

        if self.config.dimers_nc {
            self.non_covalent_pass(spec_index, spectrum, &mut s, &snapshot);
        }
    }

    fn summarize(&self, card: &SingletScoreCard, rank: usize) -> SingletSummary {
        let peptide = self.db.peptide(card.pep, card.linkable);

        let mut motifs = Vec::new();
        if let Some(k1) = card.k1 {
            let span = peptide.map[0];
            let aa = self.db.protein(span.protein).sequence[span.start + k1 as usize];
            motifs.extend_from_slice(self.linkers.motifs_for(aa));
            // Terminus promotion over every protein occurrence.
            for span in &peptide.map {
                if span.start + (k1 as usize) < 2 {
                    merge_motifs(&mut motifs, self.linkers.motifs_for(b'n'));
                }
                let protein_end = self.db.protein(span.protein).len() - 1;
                if span.start + k1 as usize == protein_end {
                    merge_motifs(&mut motifs, self.linkers.motifs_for(b'c'));
                }
            }
        }

        let mut targets = 0usize;
        let mut decoys = 0usize;
        for span in &peptide.map {
            if self
                .db
                .protein(span.protein)
                .name
                .contains(&self.config.decoy_tag)
            {
                decoys += 1;
            } else {
                targets += 1;
            }
        }
        let target = match (targets > 0, decoys > 0) {
            (true, true) => 2,
            (true, false) => 1,
            (false, _) => 0,
        };
        trace!(
            "singlet rank {} pep {} target-class {} motifs {:?}",
            rank,
            card.pep,
            target,
            motifs
        );

        SingletSummary {
            len: card.len,
            k1: card.k1,
            linkable: card.linkable,
            pep: card.pep,
            rank,
            score: card.simple_score,
            mass: if card.simple_score > 0.0 { card.mass } else { 0.0 },
            motifs,
            target,
        }
    }

    fn cross_link_pass(
        &self,
        spec_index: usize,
        spectrum: &Spectrum,
        ions: &mut IonLadder,
        s: &mut [SingletSummary],
        snapshot: &[SingletScoreCard],
    ) {
        let tolerance = self.config.ppm_precursor;
        for j in 0..s.len() {
            if s[j].score <= 0.0 || !s[j].linkable {
                continue;
            }
            let Some(k1) = s[j].k1 else {
                continue;
            };

            // One emission per partner for this j, across motifs and
            // precursors alike.
            let mut matches: Vec<usize> = Vec::new();
            let motifs = s[j].motifs.clone();
            for &motif in &motifs {
                for pair_index in 0..self.linkers.counter_motifs(motif).len() {
                    let (counter, xl_index) = self.linkers.counter_motifs(motif)[pair_index];
                    let linker_mass = self.linkers.linker(xl_index).mass;

                    for precursor in &spectrum.precursors {
                        let template = self.singlet_bin_list(
                            spectrum,
                            ions,
                            s[j].pep,
                            k1,
                            precursor,
                            s[j].mass,
                            &snapshot[s[j].rank].mods,
                        );

                        let target_mass = precursor.mono_mass - s[j].mass - linker_mass;
                        let origin = s.partition_point(|x| x.mass < target_mass);

                        let mut n = origin;
                        while n < s.len() {
                            if self.skip_candidate(s, j, n) || matches.contains(&n) {
                                n += 1;
                                continue;
                            }
                            let total = s[j].mass + s[n].mass + linker_mass;
                            let ppm = ppm_error(total, precursor.mono_mass);
                            if ppm < -tolerance {
                                n += 1;
                                continue;
                            }
                            if ppm > tolerance {
                                break;
                            }
                            if !s[n].motifs.contains(&counter) {
                                n += 1;
                                continue;
                            }
                            self.emit_cross_link(
                                spec_index, spectrum, ions, s, snapshot, j, n, xl_index, total,
                                precursor, &template,
                            );
                            matches.push(n);
                            n += 1;
                        }

                        let mut n = origin as isize - 1;
                        while n >= 0 {
                            let ni = n as usize;
                            if self.skip_candidate(s, j, ni) || matches.contains(&ni) {
                                n -= 1;
                                continue;
                            }
                            let total = s[j].mass + s[ni].mass + linker_mass;
                            let ppm = ppm_error(total, precursor.mono_mass);
                            if ppm > tolerance {
                                n -= 1;
                                continue;
                            }
                            if ppm < -tolerance {
                                break;
                            }
                            if !s[ni].motifs.contains(&counter) {
                                n -= 1;
                                continue;
                            }
                            self.emit_cross_link(
                                spec_index, spectrum, ions, s, snapshot, j, ni, xl_index, total,
                                precursor, &template,
                            );
                            matches.push(ni);
                            n -= 1;
                        }
                    }
                }
            }

            // Consumed: later iterations skip this singlet.
            s[j].score = -s[j].score;
        }
    }

    fn skip_candidate(&self, s: &[SingletSummary], j: usize, n: usize) -> bool {
        (!self.config.dimers_xl && n == j) || s[n].score < 0.0 || s[n].k1.is_none()
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_cross_link(
        &self,
        spec_index: usize,
        spectrum: &Spectrum,
        ions: &mut IonLadder,
        s: &[SingletSummary],
        snapshot: &[SingletScoreCard],
        j: usize,
        n: usize,
        xl_index: usize,
        total_mass: f64,
        precursor: &Precursor,
        template: &BinList,
    ) {
        let partner = self.singlet_bin_list(
            spectrum,
            ions,
            s[n].pep,
            s[n].k1.unwrap(),
            precursor,
            s[n].mass,
            &snapshot[s[n].rank].mods,
        );
        let shared = shared_score(spectrum, template, &partner, precursor.charge);

        let score1 = s[j].score * s[j].len as f32;
        let score2 = s[n].score * s[n].len as f32;
        let card = ScoreCard {
            simple_score: (score1 as f64 + score2 as f64 - shared) as f32,
            score1,
            score2,
            mass: total_mass,
            mass1: s[j].mass,
            mass2: s[n].mass,
            pep1: s[j].pep,
            pep2: Some(s[n].pep),
            k1: s[j].k1,
            k2: s[n].k1,
            link: LinkKind::Linker(xl_index),
            linkable1: s[j].linkable,
            linkable2: s[n].linkable,
            rank1: s[j].rank,
            rank2: s[n].rank,
            mods1: snapshot[s[j].rank].mods.clone(),
            mods2: snapshot[s[n].rank].mods.clone(),
        };
        self.spectra.check_score(spec_index, card);
    }

    /// Rebuilds a singlet ladder for a stored card and projects it onto the
    /// spectrum grid at this precursor's remainder.
    #[allow(clippy::too_many_arguments)]
    fn singlet_bin_list(
        &self,
        spectrum: &Spectrum,
        ions: &mut IonLadder,
        pep_index: usize,
        k1: u8,
        precursor: &Precursor,
        singlet_mass: f64,
        mods: &[crate::models::PepMod],
    ) -> BinList {
        let peptide = self.db.peptide(pep_index, true);
        let seq = self.db.peptide_seq(peptide);
        ions.set_peptide(true, seq, peptide.mass);
        ions.build_singlet_ions(k1 as usize);
        set_bin_list(
            spectrum,
            ions.at(0),
            precursor.charge,
            precursor.mono_mass - singlet_mass,
            mods,
        )
    }

    fn non_covalent_pass(
        &self,
        spec_index: usize,
        spectrum: &Spectrum,
        s: &mut [SingletSummary],
        snapshot: &[SingletScoreCard],
    ) {
        let tolerance = self.config.ppm_precursor;
        for j in 0..s.len() {
            if s[j].score <= 0.0 || s[j].k1.is_some() {
                continue;
            }
            for precursor in &spectrum.precursors {
                let origin = s.partition_point(|x| x.mass < precursor.mono_mass - s[j].mass);

                let mut n = origin;
                while n < s.len() {
                    if s[n].score <= 0.0 || s[n].k1.is_some() {
                        n += 1;
                        continue;
                    }
                    let total = s[j].mass + s[n].mass;
                    let ppm = ppm_error(total, precursor.mono_mass);
                    if within_tolerance(ppm, tolerance) {
                        self.emit_dimer(spec_index, s, snapshot, j, n, total);
                    } else if ppm > tolerance {
                        break;
                    }
                    n += 1;
                }

                let mut n = origin as isize - 1;
                while n >= 0 {
                    let ni = n as usize;
                    if s[ni].score <= 0.0 || s[ni].k1.is_some() {
                        n -= 1;
                        continue;
                    }
                    let total = s[j].mass + s[ni].mass;
                    let ppm = ppm_error(total, precursor.mono_mass);
                    if within_tolerance(ppm, tolerance) {
                        self.emit_dimer(spec_index, s, snapshot, j, ni, total);
                    } else if ppm < -tolerance {
                        break;
                    }
                    n -= 1;
                }
            }
            s[j].score = -s[j].score;
        }
    }

    fn emit_dimer(
        &self,
        spec_index: usize,
        s: &[SingletSummary],
        snapshot: &[SingletScoreCard],
        j: usize,
        n: usize,
        total_mass: f64,
    ) {
        let score1 = s[j].score * s[j].len as f32;
        let score2 = s[n].score * s[n].len as f32;
        let card = ScoreCard {
            simple_score: score1 + score2,
            score1,
            score2,
            mass: total_mass,
            mass1: s[j].mass,
            mass2: s[n].mass,
            pep1: s[j].pep,
            pep2: Some(s[n].pep),
            k1: None,
            k2: None,
            link: LinkKind::NonCovalent,
            linkable1: s[j].linkable,
            linkable2: s[n].linkable,
            rank1: s[j].rank,
            rank2: s[n].rank,
            mods1: snapshot[s[j].rank].mods.clone(),
            mods2: snapshot[s[n].rank].mods.clone(),
        };
        self.spectra.check_score(spec_index, card);
    }
}

fn merge_motifs(into: &mut Vec<usize>, extra: &[usize]) {
    for &motif in extra {
        if !into.contains(&motif) {
            into.push(motif);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ppm_error_sign() {
        assert!(ppm_error(1000.01, 1000.0) > 0.0);
        assert!(ppm_error(999.99, 1000.0) < 0.0);
    }

    #[test]
    fn test_tolerance_window_is_closed() {
        assert!(within_tolerance(10.0, 10.0));
        assert!(within_tolerance(-10.0, 10.0));
        assert!(within_tolerance(0.0, 10.0));
        assert!(!within_tolerance(10.0001, 10.0));
        assert!(!within_tolerance(-10.0001, 10.0));
    }
}
