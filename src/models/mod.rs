mod peptide;
mod score_card;
mod spectrum;
mod spectrum_set;

pub use peptide::{
    Peptide,
    PeptideSpan,
    Protein,
};
pub use score_card::{
    LinkKind,
    PepMod,
    ScoreCard,
    SingletScoreCard,
};
pub use spectrum::{
    Precursor,
    SparseEntry,
    Spectrum,
};
pub use spectrum_set::{
    MatchTables,
    SpectrumSet,
};
