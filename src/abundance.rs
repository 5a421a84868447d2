use serde::Serialize;

use crate::{errors::ViromeError, types::VirusDetectionResult};

/// Share of assembled contigs attributed to one virus, in percent.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct VirusAbundance {
    pub virus: String,
    pub num_contigs_in_virus: usize,
    pub total_contigs: usize,
    pub abundance: f64,
}

/// `numContigsInVirus / totalContigs * 100` for each result, in result order.
/// Zero contigs is an error rather than a NaN.
pub fn virus_abundance(
    results: &[VirusDetectionResult],
    total_contigs: usize,
) -> Result<Vec<VirusAbundance>, ViromeError> {
    if total_contigs == 0 {
        return Err(ViromeError::EmptyContigSet);
    }
    Ok(results
        .iter()
        .map(|result| VirusAbundance {
            virus: result.virus.clone(),
            num_contigs_in_virus: result.num_contigs_in_virus,
            total_contigs,
            abundance: result.num_contigs_in_virus as f64 / total_contigs as f64 * 100.0,
        })
        .collect())
}
