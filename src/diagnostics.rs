//! Per-scan dumps of the pre-pairing singlet table.

use crate::errors::{
    LinkSeekError,
    Result,
};
use crate::models::SingletScoreCard;
use crate::traits::PeptideDatabase;
use std::path::Path;

/// Writes one spectrum's stored singlets as a tab-separated table to
/// `diagnostic_<scan>.txt` in `dir`.
///
/// Rows carry the annotated sequence (`[mass]` after modified residues, `[x]`
/// after the link site), the site index (−1 when site-less), mod count, mass,
/// score, and length-weighted score. Each spectrum is handled by exactly one
/// worker, so the per-scan file has a single writer.
pub fn write_singlet_table<D: PeptideDatabase>(
    dir: &Path,
    scan_number: u32,
    singlets: &[SingletScoreCard],
    db: &D,
) -> Result<()> {
    let path = dir.join(format!("diagnostic_{}.txt", scan_number));
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .has_headers(false)
        .from_path(&path)
        .map_err(|e| match e.into_kind() {
            csv::ErrorKind::Io(source) => LinkSeekError::Io {
                source,
                path: Some(path.clone()),
            },
            other => LinkSeekError::ParseError {
                msg: format!("{:?}", other),
            },
        })?;

    writer.write_record(["Scan:".to_string(), scan_number.to_string()])?;
    for card in singlets {
        let peptide = db.peptide(card.pep, card.linkable);
        let seq = db.peptide_seq(peptide);

        let mut annotated = String::with_capacity(seq.len() * 2);
        for (q, &aa) in seq.iter().enumerate() {
            annotated.push(aa as char);
            for m in &card.mods {
                if m.pos as usize == q {
                    annotated.push_str(&format!("[{:.2}]", m.mass));
                }
            }
            if card.k1 == Some(q as u8) {
                annotated.push_str("[x]");
            }
        }

        let site = card.k1.map(|k| k as i64).unwrap_or(-1);
        writer.write_record([
            annotated,
            site.to_string(),
            card.mods.len().to_string(),
            format!("{:.6}", card.mass),
            format!("{:.4}", card.simple_score),
            format!("{:.4}", card.simple_score * card.len as f32),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
