//! Approximate k-mer matching of reference sequences against assembled contigs.
//!
//! Every distinct virus k-mer is compared with every distinct contig k-mer; a
//! pair within `max_hamming_distance` mismatches is a hit. The hit reports the
//! range of the *first* occurrence of the contig k-mer in the contig, so a
//! contig k-mer that repeats is only ever reported at its first position.

use log::debug;
use rayon::prelude::*;

use crate::{
    errors::ViromeError,
    indexer::{KmerIndexer, KmerPool},
    kmer::{first_occurrences, hamming_within, to_display},
    types::{Contig, ContigInfo, VKmerMatch, Virus, VirusDetectionResult},
};

pub const DEFAULT_MAX_HAMMING_DISTANCE: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct VirusMatcher {
    indexer: KmerIndexer,
    max_hamming_distance: usize,
}

/// Distinct k-mers of one contig with their first start offsets.
struct ContigKmers<'a> {
    contig: &'a Contig,
    kmers: Vec<(usize, &'a [u8])>,
}

impl VirusMatcher {
    pub fn new(k: usize, max_hamming_distance: usize) -> Result<Self, ViromeError> {
        Ok(VirusMatcher {
            indexer: KmerIndexer::new(k)?,
            max_hamming_distance,
        })
    }

    pub fn k(&self) -> usize {
        self.indexer.k()
    }

    pub fn max_hamming_distance(&self) -> usize {
        self.max_hamming_distance
    }

    /// One k-mer pool per virus, in the same order as `viruses`.
    pub fn virus_pools(&self, viruses: &[Virus]) -> Vec<KmerPool> {
        viruses
            .par_iter()
            .map(|virus| self.indexer.index_one(virus))
            .collect()
    }

    /// Indexes the viruses, then matches them against `contigs`.
    pub fn detect(
        &self,
        viruses: &[Virus],
        contigs: &[Contig],
    ) -> Result<Vec<VirusDetectionResult>, ViromeError> {
        let pools = self.virus_pools(viruses);
        self.detect_with_pools(viruses, &pools, contigs)
    }

    /// One result per virus, in input order. `pools[i]` must be the pool of `viruses[i]`.
    pub fn detect_with_pools(
        &self,
        viruses: &[Virus],
        pools: &[KmerPool],
        contigs: &[Contig],
    ) -> Result<Vec<VirusDetectionResult>, ViromeError> {
        if pools.len() != viruses.len() {
            return Err(ViromeError::PoolCountMismatch {
                viruses: viruses.len(),
                pools: pools.len(),
            });
        }
        if let Some(pool) = pools.iter().find(|pool| pool.k() != self.k()) {
            return Err(ViromeError::KmerSizeMismatch(self.k(), pool.k()));
        }

        let contig_kmers: Vec<ContigKmers> = contigs
            .par_iter()
            .map(|contig| ContigKmers {
                contig,
                kmers: first_occurrences(&contig.sequence, self.k()),
            })
            .collect();

        let results = viruses
            .par_iter()
            .zip(pools.par_iter())
            .map(|(virus, pool)| {
                let tested: Vec<ContigInfo> = contig_kmers
                    .par_iter()
                    .map(|ck| self.match_contig(pool, ck))
                    .collect();
                let result = VirusDetectionResult::from_tested(virus.name.clone(), tested);
                debug!(
                    "Virus {} ({} bp, {} distinct k-mers): {} of {} contigs matched",
                    virus.name,
                    virus.sequence.len(),
                    pool.len(),
                    result.num_contigs_in_virus,
                    contigs.len()
                );
                result
            })
            .collect();
        Ok(results)
    }

    fn match_contig(&self, virus_pool: &KmerPool, contig: &ContigKmers) -> ContigInfo {
        let k = self.k();
        let mut info = ContigInfo::new(contig.contig);
        for virus_kmer in virus_pool.kmers() {
            for &(start, contig_kmer) in &contig.kmers {
                if let Some(distance) =
                    hamming_within(virus_kmer, contig_kmer, self.max_hamming_distance)
                {
                    info.record(VKmerMatch {
                        virus_kmer: to_display(virus_kmer),
                        contig_range: start..start + k,
                        hamming_distance: distance,
                        kmer_length: contig_kmer.len(),
                    });
                }
            }
        }
        info
    }

    /// Matches a single virus against a single contig.
    pub fn match_one(&self, virus: &Virus, contig: &Contig) -> ContigInfo {
        let pool = self.indexer.index_one(virus);
        let kmers = ContigKmers {
            contig,
            kmers: first_occurrences(&contig.sequence, self.k()),
        };
        self.match_contig(&pool, &kmers)
    }
}
