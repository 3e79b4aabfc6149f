//! The two fragment-match kernels.
//!
//! Both walk every enabled series at fragment charges `1..min(precursor
//! charge, 6)` and accumulate the spectrum's preprocessed intensity at each
//! theoretical bin, then scale by 0.005 and clamp at zero. They differ only in
//! the lookup structure: the XCorr kernel reads the sparse step function, the
//! kojak kernel the two-level (key, sub-bin) array.

use crate::fragment_ions::{
    IonSet,
    NUM_SERIES,
};
use crate::models::Spectrum;

const SCORE_SCALE: f64 = 0.005;
const MAX_FRAGMENT_CHARGE_EXCLUSIVE: usize = 6;

fn charge_range(spectrum: &Spectrum) -> std::ops::Range<usize> {
    1..(spectrum.charge as usize).min(MAX_FRAGMENT_CHARGE_EXCLUSIVE)
}

/// XCorr-style score of one ion set against a spectrum, with `offset` the
/// neutral mass attributed to open link sites.
pub fn xcorr_score(
    spectrum: &Spectrum,
    set: &IonSet,
    offset: f64,
    series_enabled: [bool; NUM_SERIES],
) -> f32 {
    let mut total = 0.0f64;
    for charge in charge_range(spectrum) {
        for (series, enabled) in series_enabled.iter().enumerate() {
            if !enabled {
                continue;
            }
            for ion in &set.series[series] {
                let mz = ion.mz(charge, offset);
                let bin = (mz * spectrum.inv_bin_size + spectrum.bin_offset) as i32;
                total += spectrum.xcorr_intensity_at(bin) as f64;
            }
        }
    }
    scale(total)
}

/// Two-level sparse variant; a key past the spectrum's last bin ends the
/// series walk at that charge.
pub fn kojak_score(
    spectrum: &Spectrum,
    set: &IonSet,
    offset: f64,
    series_enabled: [bool; NUM_SERIES],
) -> f32 {
    let mut total = 0.0f64;
    for charge in charge_range(spectrum) {
        for (series, enabled) in series_enabled.iter().enumerate() {
            if !enabled {
                continue;
            }
            for ion in &set.series[series] {
                let mz = ion.mz(charge, offset);
                let quantized = spectrum.bin_size
                    * ((mz * spectrum.inv_bin_size + spectrum.bin_offset) as i64 as f64);
                let key = quantized as i64;
                if key >= spectrum.kojak_bins as i64 {
                    break;
                }
                let pos = ((quantized - key as f64) * spectrum.inv_bin_size) as i32;
                total += spectrum.kojak_intensity_at(key as i32, pos) as f64;
            }
        }
    }
    scale(total)
}

fn scale(total: f64) -> f32 {
    if total <= 0.0 {
        0.0
    } else {
        (total * SCORE_SCALE) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem;
    use crate::fragment_ions::IonLadder;
    use crate::models::Precursor;

    const BY: [bool; NUM_SERIES] = [false, true, false, false, true, false];

    fn ladder_set(seq: &[u8]) -> IonLadder {
        let mut l = IonLadder::new(BY);
        l.set_peptide(true, seq, chem::peptide_neutral_mass(seq));
        l.build_ions();
        l
    }

    fn spectrum_matching(seq: &[u8], precursor_charge: u8) -> Spectrum {
        let ladder = ladder_set(seq);
        let set = ladder.at(0);
        let mut peaks = Vec::new();
        for series in [1usize, 4] {
            for ion in &set.series[series] {
                peaks.push((ion.mz(1, 0.0), 10.0f32));
            }
        }
        let mut s = Spectrum::new(
            7,
            vec![Precursor {
                mono_mass: chem::peptide_neutral_mass(seq),
                charge: precursor_charge,
            }],
            0.03,
            0.0,
        );
        s.index_peaks(&peaks);
        s
    }

    #[test]
    fn test_kernels_reward_matching_peaks() {
        let spectrum = spectrum_matching(b"SAMPLER", 2);
        let ladder = ladder_set(b"SAMPLER");
        let set = ladder.at(0);

        // 12 singly-charged fragments at intensity 10, scaled by 0.005.
        let xc = xcorr_score(&spectrum, set, 0.0, BY);
        let kj = kojak_score(&spectrum, set, 0.0, BY);
        assert!((xc - 0.6).abs() < 1e-6, "xcorr {}", xc);
        assert!((kj - 0.6).abs() < 1e-6, "kojak {}", kj);

        // A different peptide finds nothing.
        let other = ladder_set(b"WGGDGYW");
        assert_eq!(xcorr_score(&spectrum, other.at(0), 0.0, BY), 0.0);
        assert_eq!(kojak_score(&spectrum, other.at(0), 0.0, BY), 0.0);
    }

    #[test]
    fn test_scoring_is_pure() {
        let spectrum = spectrum_matching(b"SAMPLER", 3);
        let ladder = ladder_set(b"SAMPLER");
        let set = ladder.at(0);
        let a = kojak_score(&spectrum, set, 0.0, BY);
        let b = kojak_score(&spectrum, set, 0.0, BY);
        assert_eq!(a, b);
        assert!(a > 0.0);
    }

    #[test]
    fn test_charge_one_precursor_scores_nothing() {
        let mut spectrum = spectrum_matching(b"SAMPLER", 2);
        spectrum.charge = 1;
        let ladder = ladder_set(b"SAMPLER");
        assert_eq!(kojak_score(&spectrum, ladder.at(0), 0.0, BY), 0.0);
    }

    #[test]
    fn test_open_ions_score_with_offset() {
        // Build a singlet ladder and a spectrum holding the link-resolved
        // fragment masses; scoring must succeed only at the right offset.
        let partner_mass = 500.0;
        let mut l = IonLadder::new(BY);
        l.set_peptide(true, b"SAMPLEK", chem::peptide_neutral_mass(b"SAMPLEK"));
        l.build_singlet_ions(6);
        let set = l.at(0);

        let mut peaks = Vec::new();
        for series in [1usize, 4] {
            for ion in &set.series[series] {
                peaks.push((ion.mz(1, partner_mass), 10.0f32));
            }
        }
        let mut s = Spectrum::new(
            9,
            vec![Precursor {
                mono_mass: chem::peptide_neutral_mass(b"SAMPLEK") + partner_mass,
                charge: 2,
            }],
            0.03,
            0.0,
        );
        s.index_peaks(&peaks);

        let hit = kojak_score(&s, set, partner_mass, BY);
        let miss = kojak_score(&s, set, partner_mass + 50.0, BY);
        assert!(hit > 0.0);
        assert!(miss < hit);
    }
}
