use crate::errors::Result;
use crate::linkers::CrossLinker;
use serde::{
    Deserialize,
    Serialize,
};
use std::path::PathBuf;

/// Search parameters supplied once at startup.
///
/// Everything is defaulted so partial JSON documents configure only what they
/// need.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Worker thread count for both analysis stages.
    pub threads: usize,

    /// Precursor mass tolerance in parts per million.
    pub ppm_precursor: f64,

    /// Which fragment-ion series to score.
    pub ion_series: IonSeriesConfig,

    /// Fragment bin width and offset shared by both scoring kernels.
    pub bin_size: f64,
    pub bin_offset: f64,

    /// Scoring kernel selection.
    pub kernel: ScoreKernel,

    /// Cap on variable modifications per peptide.
    pub max_mods: usize,

    /// Partner-peptide mass bounds for singlet precursor windows.
    pub min_pep_mass: f64,
    pub max_pep_mass: f64,

    /// Whether mono-links may be placed on cross-linked peptides.
    pub mono_links_on_xl: bool,
    /// Whether variable mods may be placed on a linked residue.
    pub diff_mods_on_xl: bool,

    /// Allow non-covalent dimer search.
    pub dimers_nc: bool,
    /// Allow a singlet to cross-link with itself.
    pub dimers_xl: bool,

    /// Substring in a protein name marking decoy entries.
    pub decoy_tag: String,

    /// Scan numbers whose pre-pairing singlet tables are dumped to disk.
    pub diag_scans: Vec<u32>,
    /// Directory receiving the diagnostic dumps.
    pub diag_dir: PathBuf,

    /// Per-spectrum retention caps.
    pub top_count: usize,
    pub singlet_cap: usize,

    pub fixed_mods: Vec<ModDef>,
    pub variable_mods: Vec<ModDef>,

    pub linkers: Vec<CrossLinker>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            ppm_precursor: 10.0,
            ion_series: IonSeriesConfig::default(),
            bin_size: 0.03,
            bin_offset: 0.0,
            kernel: ScoreKernel::Kojak,
            max_mods: 3,
            min_pep_mass: 500.0,
            max_pep_mass: 4000.0,
            mono_links_on_xl: false,
            diff_mods_on_xl: false,
            dimers_nc: false,
            dimers_xl: false,
            decoy_tag: "decoy".to_string(),
            diag_scans: Vec::new(),
            diag_dir: PathBuf::from("."),
            top_count: 20,
            singlet_cap: 250,
            fixed_mods: Vec::new(),
            variable_mods: Vec::new(),
            linkers: Vec::new(),
        }
    }
}

impl SearchConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        Ok(config)
    }
}

/// One fixed or variable modification definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModDef {
    pub residue: char,
    pub mass: f64,
    /// Valid only on peptides participating in a cross-link.
    #[serde(default)]
    pub xl_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreKernel {
    #[serde(rename = "xcorr")]
    XCorr,
    #[serde(rename = "kojak")]
    Kojak,
}

/// Enable flags for the six backbone fragment series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct IonSeriesConfig {
    pub a: bool,
    pub b: bool,
    pub c: bool,
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl Default for IonSeriesConfig {
    fn default() -> Self {
        Self {
            a: false,
            b: true,
            c: false,
            x: false,
            y: true,
            z: false,
        }
    }
}

impl IonSeriesConfig {
    pub fn as_flags(&self) -> [bool; 6] {
        [self.a, self.b, self.c, self.x, self.y, self.z]
    }

    pub fn enabled_count(&self) -> usize {
        self.as_flags().iter().filter(|x| **x).count()
    }
}
