//! Cross-linker definitions and the residue-to-motif lookup tables.
//!
//! A motif is an ordered class of residue symbols (including the `n`/`c`
//! terminus pseudo-residues) that one end of a linker can react with. The
//! iteration order of motifs and counter-motifs fixes the enumeration order of
//! loop-link and cross-link candidates, so both tables preserve declaration
//! order.

use crate::errors::{
    LinkSeekError,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossLinker {
    pub label: String,
    pub mass: f64,
    /// Residue symbols reactive at the first end, e.g. "K" or "nK".
    pub site_a: String,
    /// Residue symbols reactive at the second end. Ignored for mono-linkers.
    #[serde(default)]
    pub site_b: String,
    /// Mono-linkers cap a single site and never pair two peptides.
    #[serde(default)]
    pub is_mono: bool,
}

#[derive(Debug, Clone)]
pub struct LinkerTable {
    linkers: Vec<CrossLinker>,
    /// Motif id -> the site string that defines it.
    motifs: Vec<String>,
    /// Residue symbol -> motif ids it belongs to, in declaration order.
    residue_motifs: Vec<Vec<usize>>,
    /// Motif id -> (counter-motif id, linker index), in declaration order.
    counter: Vec<Vec<(usize, usize)>>,
    low_link_mass: f64,
    high_link_mass: f64,
}

impl LinkerTable {
    pub fn new(linkers: Vec<CrossLinker>) -> Result<Self> {
        let mut table = Self {
            linkers: Vec::new(),
            motifs: Vec::new(),
            residue_motifs: vec![Vec::new(); 128],
            counter: Vec::new(),
            low_link_mass: 0.0,
            high_link_mass: 0.0,
        };

        for (idx, linker) in linkers.iter().enumerate() {
            if linker.site_a.is_empty() {
                return Err(LinkSeekError::ConfigError {
                    msg: format!("linker {} has an empty site_a motif", linker.label),
                });
            }
            if !linker.is_mono && linker.site_b.is_empty() {
                return Err(LinkSeekError::ConfigError {
                    msg: format!("linker {} has an empty site_b motif", linker.label),
                });
            }

            let a = table.intern_motif(&linker.site_a);
            if linker.is_mono {
                continue;
            }
            let b = table.intern_motif(&linker.site_b);

            table.counter[a].push((b, idx));
            if b != a {
                table.counter[b].push((a, idx));
            }

            if table.low_link_mass == 0.0 || linker.mass < table.low_link_mass {
                table.low_link_mass = linker.mass;
            }
            if table.high_link_mass == 0.0 || linker.mass > table.high_link_mass {
                table.high_link_mass = linker.mass;
            }
        }

        table.linkers = linkers;
        Ok(table)
    }

    fn intern_motif(&mut self, site: &str) -> usize {
        if let Some(id) = self.motifs.iter().position(|x| x == site) {
            return id;
        }
        let id = self.motifs.len();
        self.motifs.push(site.to_string());
        self.counter.push(Vec::new());
        for symbol in site.bytes() {
            let cell = &mut self.residue_motifs[symbol as usize];
            if !cell.contains(&id) {
                cell.push(id);
            }
        }
        id
    }

    /// Motif ids the residue symbol belongs to. `n` and `c` address the
    /// terminus pseudo-residues.
    pub fn motifs_for(&self, symbol: u8) -> &[usize] {
        &self.residue_motifs[symbol as usize]
    }

    /// Ordered (counter-motif, linker index) pairs for a motif.
    pub fn counter_motifs(&self, motif: usize) -> &[(usize, usize)] {
        &self.counter[motif]
    }

    pub fn counter_motif(&self, motif: usize, i: usize) -> Option<usize> {
        self.counter[motif].get(i).map(|x| x.0)
    }

    pub fn xl_index(&self, motif: usize, i: usize) -> Option<usize> {
        self.counter[motif].get(i).map(|x| x.1)
    }

    pub fn linker(&self, index: usize) -> &CrossLinker {
        &self.linkers[index]
    }

    pub fn len(&self) -> usize {
        self.linkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.linkers.is_empty()
    }

    pub fn linkers(&self) -> &[CrossLinker] {
        &self.linkers
    }

    /// Smallest non-mono linker mass, 0.0 when there is none.
    pub fn low_link_mass(&self) -> f64 {
        self.low_link_mass
    }

    /// Largest non-mono linker mass, 0.0 when there is none.
    pub fn high_link_mass(&self) -> f64 {
        self.high_link_mass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dss() -> CrossLinker {
        CrossLinker {
            label: "DSS".to_string(),
            mass: 138.0680796,
            site_a: "K".to_string(),
            site_b: "K".to_string(),
            is_mono: false,
        }
    }

    #[test]
    fn test_symmetric_linker() {
        let table = LinkerTable::new(vec![dss()]).unwrap();
        assert_eq!(table.motifs_for(b'K'), &[0]);
        assert!(table.motifs_for(b'R').is_empty());
        // A symmetric linker produces a single counter entry.
        assert_eq!(table.counter_motifs(0), &[(0, 0)]);
        assert_eq!(table.counter_motif(0, 0), Some(0));
        assert_eq!(table.xl_index(0, 0), Some(0));
    }

    #[test]
    fn test_asymmetric_linker() {
        let edc = CrossLinker {
            label: "EDC".to_string(),
            mass: -18.0105646,
            site_a: "K".to_string(),
            site_b: "DE".to_string(),
            is_mono: false,
        };
        let table = LinkerTable::new(vec![edc]).unwrap();
        assert_eq!(table.motifs_for(b'K'), &[0]);
        assert_eq!(table.motifs_for(b'D'), &[1]);
        assert_eq!(table.motifs_for(b'E'), &[1]);
        assert_eq!(table.counter_motifs(0), &[(1, 0)]);
        assert_eq!(table.counter_motifs(1), &[(0, 0)]);
    }

    #[test]
    fn test_mono_linker_excluded_from_extrema_and_pairing() {
        let mono = CrossLinker {
            label: "DSS-OH".to_string(),
            mass: 156.0786,
            site_a: "K".to_string(),
            site_b: String::new(),
            is_mono: true,
        };
        let table = LinkerTable::new(vec![mono, dss()]).unwrap();
        assert_eq!(table.low_link_mass(), 138.0680796);
        assert_eq!(table.high_link_mass(), 138.0680796);
        // The mono linker registered its motif but no counter entries.
        assert_eq!(table.motifs_for(b'K'), &[0]);
        assert_eq!(table.counter_motifs(0), &[(0, 1)]);
    }

    #[test]
    fn test_terminus_pseudo_residues() {
        let linker = CrossLinker {
            label: "BS3".to_string(),
            mass: 138.0680796,
            site_a: "nK".to_string(),
            site_b: "nK".to_string(),
            is_mono: false,
        };
        let table = LinkerTable::new(vec![linker]).unwrap();
        assert_eq!(table.motifs_for(b'n'), &[0]);
        assert_eq!(table.motifs_for(b'K'), &[0]);
        assert!(table.motifs_for(b'c').is_empty());
    }
}
