use crate::models::{
    Peptide,
    Protein,
};

/// The database collaborator contract.
///
/// Peptide lists arrive sorted by mass ascending; `linkable` selects between
/// the list of peptides carrying at least one candidate link site and the rest.
/// The engine only ever borrows immutably, so implementations need no interior
/// mutability.
pub trait PeptideDatabase: Sync {
    fn protein(&self, index: usize) -> &Protein;

    fn peptide_list(&self, linkable: bool) -> &[Peptide];

    fn peptide(&self, index: usize, linkable: bool) -> &Peptide {
        &self.peptide_list(linkable)[index]
    }

    /// Residues of the peptide's canonical occurrence.
    fn peptide_seq<'a>(&'a self, peptide: &Peptide) -> &'a [u8] {
        let span = &peptide.map[0];
        &self.protein(span.protein).sequence[span.start..=span.stop]
    }
}
