use serde::Serialize;
use std::cmp::Ordering;

/// One placed variable modification, position-relative to the peptide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PepMod {
    pub pos: u8,
    pub mass: f64,
}

/// What joins the two sides of a full match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkKind {
    /// Plain single peptide, no link involved.
    None,
    /// Non-covalent dimer.
    NonCovalent,
    /// Loop-link or cross-link through the indexed linker.
    Linker(usize),
}

impl LinkKind {
    fn sort_key(&self) -> i64 {
        match self {
            LinkKind::None => -1,
            LinkKind::NonCovalent => -2,
            LinkKind::Linker(i) => *i as i64,
        }
    }
}

/// A full peptide-to-spectrum match: singleton, loop-link, cross-link, or
/// non-covalent dimer.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreCard {
    pub simple_score: f32,
    /// Length-weighted component scores of each side (cross-links only).
    pub score1: f32,
    pub score2: f32,
    pub mass: f64,
    pub mass1: f64,
    pub mass2: f64,
    pub pep1: usize,
    pub pep2: Option<usize>,
    pub k1: Option<u8>,
    pub k2: Option<u8>,
    pub link: LinkKind,
    pub linkable1: bool,
    pub linkable2: bool,
    /// Singlet-table positions the sides came from (cross-links only).
    pub rank1: usize,
    pub rank2: usize,
    pub mods1: Vec<PepMod>,
    pub mods2: Vec<PepMod>,
}

impl ScoreCard {
    /// Ranking inside a spectrum's top table: score descending, then a
    /// deterministic structural tie-break so the retained set is independent
    /// of submission order.
    pub fn table_ordering(&self, other: &Self) -> Ordering {
        other
            .simple_score
            .partial_cmp(&self.simple_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.pep1.cmp(&other.pep1))
            .then_with(|| opt_key(self.pep2).cmp(&opt_key(other.pep2)))
            .then_with(|| opt_key8(self.k1).cmp(&opt_key8(other.k1)))
            .then_with(|| opt_key8(self.k2).cmp(&opt_key8(other.k2)))
            .then_with(|| self.link.sort_key().cmp(&other.link.sort_key()))
    }
}

/// A singlet: one peptide explaining part of a precursor, with the remainder
/// attributed to an unknown partner on the link site `k1`.
#[derive(Debug, Clone, Serialize)]
pub struct SingletScoreCard {
    pub pep: usize,
    /// Link-site position, `None` for site-less non-covalent candidates.
    pub k1: Option<u8>,
    /// Which peptide list `pep` indexes into.
    pub linkable: bool,
    pub len: usize,
    /// Peptide mass including placed modifications.
    pub mass: f64,
    /// Score divided by peptide length.
    pub simple_score: f32,
    pub mods: Vec<PepMod>,
}

impl SingletScoreCard {
    pub fn table_ordering(&self, other: &Self) -> Ordering {
        other
            .simple_score
            .partial_cmp(&self.simple_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.pep.cmp(&other.pep))
            .then_with(|| opt_key8(self.k1).cmp(&opt_key8(other.k1)))
            .then_with(|| self.mass.partial_cmp(&other.mass).unwrap_or(Ordering::Equal))
    }
}

fn opt_key(x: Option<usize>) -> i64 {
    match x {
        Some(v) => v as i64,
        None => -1,
    }
}

fn opt_key8(x: Option<u8>) -> i64 {
    match x {
        Some(v) => v as i64,
        None => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(score: f32, pep1: usize) -> ScoreCard {
        ScoreCard {
            simple_score: score,
            score1: 0.0,
            score2: 0.0,
            mass: 0.0,
            mass1: 0.0,
            mass2: 0.0,
            pep1,
            pep2: None,
            k1: None,
            k2: None,
            link: LinkKind::None,
            linkable1: false,
            linkable2: false,
            rank1: 0,
            rank2: 0,
            mods1: Vec::new(),
            mods2: Vec::new(),
        }
    }

    #[test]
    fn test_score_orders_first() {
        assert_eq!(card(2.0, 5).table_ordering(&card(1.0, 0)), Ordering::Less);
        assert_eq!(card(1.0, 5).table_ordering(&card(2.0, 0)), Ordering::Greater);
    }

    #[test]
    fn test_tie_break_is_structural() {
        // Equal scores rank by peptide index, independent of insertion order.
        assert_eq!(card(1.0, 1).table_ordering(&card(1.0, 2)), Ordering::Less);
        assert_eq!(card(1.0, 2).table_ordering(&card(1.0, 1)), Ordering::Greater);
    }
}
