//! Fragment bin coordinates for cross-link candidates.
//!
//! During relaxed pairing each singlet's ladder is projected onto the
//! spectrum's (key, sub-bin) grid once per precursor, so the ions two paired
//! peptides would both claim can be found and their double-counted intensity
//! deducted from the combined score.

use crate::fragment_ions::{
    is_n_terminal_series,
    IonSet,
    NUM_SERIES,
};
use crate::models::{
    PepMod,
    Spectrum,
};
use std::collections::HashSet;

const SCORE_SCALE: f64 = 0.005;
const MAX_FRAGMENT_CHARGE_EXCLUSIVE: usize = 6;

/// (key, sub-bin) coordinates per series and fragment charge.
#[derive(Debug, Default)]
pub struct BinList {
    /// Indexed `[series][charge - 1]`.
    entries: [Vec<Vec<(i32, i32)>>; NUM_SERIES],
}

impl BinList {
    pub fn series_at_charge(&self, series: usize, charge: usize) -> &[(i32, i32)] {
        self.entries[series]
            .get(charge - 1)
            .map(|x| x.as_slice())
            .unwrap_or(&[])
    }
}

/// Projects a singlet ion set onto the spectrum grid.
///
/// `offset` is the precursor-mass remainder closing the open link site and
/// `mods` the variable modifications recorded on the stored singlet card.
/// N-terminal series fragment `j` accumulates mods placed at positions `<= j`;
/// C-terminal series fragment `j` accumulates mods at positions covering the
/// last `j + 1` residues.
pub fn set_bin_list(
    spectrum: &Spectrum,
    set: &IonSet,
    charge: u8,
    offset: f64,
    mods: &[PepMod],
) -> BinList {
    let ion_count = set.ion_count();
    let mut fwd = vec![0.0f64; ion_count];
    let mut rev = vec![0.0f64; ion_count];
    for m in mods {
        let pos = m.pos as usize;
        for slot in fwd.iter_mut().skip(pos) {
            *slot += m.mass;
        }
        for slot in rev.iter_mut().skip(ion_count.saturating_sub(pos)) {
            *slot += m.mass;
        }
    }

    let max_charge = (charge as usize).min(MAX_FRAGMENT_CHARGE_EXCLUSIVE);
    let mut out = BinList::default();
    for (series, ions) in set.series.iter().enumerate() {
        if ions.is_empty() {
            continue;
        }
        let acc = if is_n_terminal_series(series) {
            &fwd
        } else {
            &rev
        };
        for z in 1..max_charge {
            let coords = ions
                .iter()
                .enumerate()
                .map(|(i, ion)| {
                    let mz = ion.mz(z, offset) + acc[i] / z as f64;
                    let quantized = spectrum.bin_size
                        * ((mz * spectrum.inv_bin_size + spectrum.bin_offset) as i64 as f64);
                    let key = quantized as i32;
                    let pos = ((quantized - key as f64) * spectrum.inv_bin_size) as i32;
                    (key, pos)
                })
                .collect();
            out.entries[series].push(coords);
        }
    }
    out
}

/// Spectrum intensity claimed by both bin lists, scaled like the kernels.
///
/// Coordinates are intersected per (series, charge); a bin shared several
/// times still counts once.
pub fn shared_score(spectrum: &Spectrum, m1: &BinList, m2: &BinList, charge: u8) -> f64 {
    let max_charge = (charge as usize).min(MAX_FRAGMENT_CHARGE_EXCLUSIVE);
    let mut total = 0.0f64;
    for series in 0..NUM_SERIES {
        for z in 1..max_charge {
            let a = m1.series_at_charge(series, z);
            let b = m2.series_at_charge(series, z);
            if a.is_empty() || b.is_empty() {
                continue;
            }
            let sa: HashSet<(i32, i32)> = a.iter().copied().collect();
            let sb: HashSet<(i32, i32)> = b.iter().copied().collect();
            for &(key, pos) in sa.intersection(&sb) {
                total += spectrum.kojak_intensity_at(key, pos) as f64;
            }
        }
    }
    if total <= 0.0 {
        0.0
    } else {
        total * SCORE_SCALE
    }
}
