use crate::chem;
use crate::models::{
    Peptide,
    PeptideSpan,
    Protein,
};
use crate::traits::PeptideDatabase;

/// Reference implementation of the database collaborator: proteins and
/// pre-digested peptides held in memory, peptide lists kept sorted by mass.
///
/// FASTA parsing and in-silico digestion stay with the real database
/// collaborator; this container is for embedding and tests.
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    proteins: Vec<Protein>,
    linkable: Vec<Peptide>,
    plain: Vec<Peptide>,
}

impl InMemoryDatabase {
    pub fn new(proteins: Vec<Protein>) -> Self {
        Self {
            proteins,
            linkable: Vec::new(),
            plain: Vec::new(),
        }
    }

    /// Registers a peptide spanning `start..=stop` of a protein. The mass is
    /// computed from the unmodified residues; callers applying fixed
    /// modifications use [`Self::add_peptide_with_mass`] instead.
    pub fn add_peptide(&mut self, protein: usize, start: usize, stop: usize, linkable: bool) {
        let mass = chem::peptide_neutral_mass(&self.proteins[protein].sequence[start..=stop]);
        self.add_peptide_with_mass(protein, start, stop, linkable, mass);
    }

    pub fn add_peptide_with_mass(
        &mut self,
        protein: usize,
        start: usize,
        stop: usize,
        linkable: bool,
        mass: f64,
    ) {
        let span = PeptideSpan {
            protein,
            start,
            stop,
        };
        let peptide = Peptide {
            map: vec![span],
            mass,
            n_term: start < 2,
            c_term: stop + 1 == self.proteins[protein].len(),
        };
        if linkable {
            self.linkable.push(peptide);
        } else {
            self.plain.push(peptide);
        }
    }

    /// Sorts both peptide lists by mass; call once after the last insert.
    pub fn finalize(mut self) -> Self {
        self.linkable
            .sort_by(|a, b| a.mass.partial_cmp(&b.mass).unwrap());
        self.plain
            .sort_by(|a, b| a.mass.partial_cmp(&b.mass).unwrap());
        self
    }
}

impl PeptideDatabase for InMemoryDatabase {
    fn protein(&self, index: usize) -> &Protein {
        &self.proteins[index]
    }

    fn peptide_list(&self, linkable: bool) -> &[Peptide] {
        if linkable {
            &self.linkable
        } else {
            &self.plain
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peptides_sorted_by_mass() {
        let mut db = InMemoryDatabase::new(vec![Protein::new("P1", b"KAMPLERSAMPLEK")]);
        db.add_peptide(0, 0, 6, true);
        db.add_peptide(0, 7, 13, true);
        let db = db.finalize();
        let list = db.peptide_list(true);
        assert_eq!(list.len(), 2);
        assert!(list[0].mass <= list[1].mass);
        assert_eq!(db.peptide_seq(&list[0]), b"SAMPLEK");
    }

    #[test]
    fn test_terminus_flags() {
        let mut db = InMemoryDatabase::new(vec![Protein::new("P1", b"MKAMPLERAA")]);
        // Position 1 counts as N-terminal (initiator methionine removal).
        db.add_peptide(0, 1, 7, true);
        db.add_peptide(0, 2, 9, true);
        let db = db.finalize();
        let list = db.peptide_list(true);
        let first = list.iter().find(|p| p.map[0].start == 1).unwrap();
        let second = list.iter().find(|p| p.map[0].start == 2).unwrap();
        assert!(first.n_term && !first.c_term);
        assert!(!second.n_term && second.c_term);
    }
}
