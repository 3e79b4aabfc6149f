use super::score_card::{
    ScoreCard,
    SingletScoreCard,
};
use super::spectrum::Spectrum;
use std::sync::Mutex;

/// Per-spectrum retained matches, guarded by that spectrum's mutex.
#[derive(Debug, Default)]
pub struct MatchTables {
    pub score_cards: Vec<ScoreCard>,
    pub singlets: Vec<SingletScoreCard>,
}

/// The spectrum collection plus everything the analysis stages mutate.
///
/// Spectra and their peak structures are immutable during analysis; only the
/// per-spectrum top-match and singlet tables change, always under the
/// spectrum's own mutex.
#[derive(Debug)]
pub struct SpectrumSet {
    spectra: Vec<Spectrum>,
    tables: Vec<Mutex<MatchTables>>,
    /// (precursor mono mass, spectrum index), sorted by mass.
    mass_index: Vec<(f64, u32)>,
    top_count: usize,
    singlet_cap: usize,
}

impl SpectrumSet {
    pub fn new(spectra: Vec<Spectrum>, top_count: usize, singlet_cap: usize) -> Self {
        let mut mass_index: Vec<(f64, u32)> = spectra
            .iter()
            .enumerate()
            .flat_map(|(i, s)| {
                s.precursors
                    .iter()
                    .map(move |p| (p.mono_mass, i as u32))
            })
            .collect();
        mass_index.sort_unstable_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        let tables = spectra.iter().map(|_| Mutex::default()).collect();
        Self {
            spectra,
            tables,
            mass_index,
            top_count,
            singlet_cap,
        }
    }

    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }

    pub fn spectrum(&self, index: usize) -> &Spectrum {
        &self.spectra[index]
    }

    /// Smallest precursor mass across all spectra.
    pub fn min_precursor_mass(&self) -> f64 {
        self.mass_index.first().map(|x| x.0).unwrap_or(0.0)
    }

    /// Largest precursor mass across all spectra.
    pub fn max_precursor_mass(&self) -> f64 {
        self.mass_index.last().map(|x| x.0).unwrap_or(0.0)
    }

    /// Indices of spectra with any precursor inside the closed mass range.
    pub fn boundaries(&self, min_mass: f64, max_mass: f64) -> Vec<usize> {
        let lo = self.mass_index.partition_point(|x| x.0 < min_mass);
        let hi = self.mass_index.partition_point(|x| x.0 <= max_mass);
        let mut out: Vec<usize> = self.mass_index[lo..hi]
            .iter()
            .map(|x| x.1 as usize)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Indices of spectra with any precursor within `ppm` of `mass`
    /// (closed-inclusive on both sides).
    pub fn boundaries_ppm(&self, mass: f64, ppm: f64) -> Vec<usize> {
        let width = mass / 1e6 * ppm;
        self.boundaries(mass - width, mass + width)
    }

    /// Inserts a full match into the spectrum's top table, discarding it if it
    /// ranks below the retained set.
    pub fn check_score(&self, index: usize, card: ScoreCard) {
        let mut tables = self.tables[index].lock().unwrap();
        let at = tables
            .score_cards
            .partition_point(|x| x.table_ordering(&card).is_lt());
        if at >= self.top_count {
            return;
        }
        tables.score_cards.insert(at, card);
        tables.score_cards.truncate(self.top_count);
    }

    /// Inserts a singlet into the spectrum's singlet table, same discipline as
    /// [`Self::check_score`].
    pub fn check_singlet_score(&self, index: usize, card: SingletScoreCard) {
        let mut tables = self.tables[index].lock().unwrap();
        let at = tables
            .singlets
            .partition_point(|x| x.table_ordering(&card).is_lt());
        if at >= self.singlet_cap {
            return;
        }
        tables.singlets.insert(at, card);
        tables.singlets.truncate(self.singlet_cap);
    }

    pub fn singlet_count(&self, index: usize) -> usize {
        self.tables[index].lock().unwrap().singlets.len()
    }

    /// The singlet at table position `rank`, best-first.
    pub fn singlet_score_card(&self, index: usize, rank: usize) -> SingletScoreCard {
        self.tables[index].lock().unwrap().singlets[rank].clone()
    }

    /// Clones the spectrum's singlet list. Stage 3 works on this snapshot;
    /// card positions in it are the `rank` values recorded on cross-links.
    pub fn snapshot_singlets(&self, index: usize) -> Vec<SingletScoreCard> {
        self.tables[index].lock().unwrap().singlets.clone()
    }

    /// Clones the spectrum's retained full matches, best first.
    pub fn score_cards(&self, index: usize) -> Vec<ScoreCard> {
        self.tables[index].lock().unwrap().score_cards.clone()
    }
}
