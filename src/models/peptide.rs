use serde::Serialize;

/// One database protein. Decoy status is derived by substring-matching the
/// configured decoy tag against `name`.
#[derive(Debug, Clone, Serialize)]
pub struct Protein {
    pub name: String,
    pub sequence: Vec<u8>,
}

impl Protein {
    pub fn new(name: impl Into<String>, sequence: impl AsRef<[u8]>) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.as_ref().to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// One occurrence of a peptide inside a protein. `stop` is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeptideSpan {
    pub protein: usize,
    pub start: usize,
    pub stop: usize,
}

/// A peptide as handed over by the database collaborator.
///
/// The first span is the canonical occurrence; the remaining spans are other
/// protein occurrences, consulted for terminus promotion and target/decoy
/// classing.
#[derive(Debug, Clone, Serialize)]
pub struct Peptide {
    pub map: Vec<PeptideSpan>,
    /// Neutral monoisotopic mass including fixed modifications.
    pub mass: f64,
    /// Any occurrence starts within the first two protein residues.
    pub n_term: bool,
    /// Any occurrence ends its protein.
    pub c_term: bool,
}

impl Peptide {
    pub fn len(&self) -> usize {
        let span = &self.map[0];
        span.stop - span.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
