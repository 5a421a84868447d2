use dashmap::DashMap;
use log::debug;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};

use crate::{
    errors::ViromeError,
    kmer::{kmer_windows, to_display},
    types::{Read, Virus},
};

/// Anything the indexer can slide a window over: an identifier plus a literal sequence.
pub trait SequenceSource: Sync {
    fn source_id(&self) -> &str;
    fn sequence(&self) -> &[u8];
}

impl SequenceSource for Read {
    fn source_id(&self) -> &str {
        &self.id
    }
    fn sequence(&self) -> &[u8] {
        &self.sequence
    }
}

impl SequenceSource for Virus {
    fn source_id(&self) -> &str {
        &self.name
    }
    fn sequence(&self) -> &[u8] {
        &self.sequence
    }
}

/// A single k-mer occurrence: index of the source in the pool's source list and
/// 0-based start offset within that source. The end offset is `start + k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Occurrence {
    pub source: usize,
    pub start: usize,
}

/// Flat k-mer table. Each distinct k-mer gets an interned id; ids are assigned
/// in order of first occurrence (source order, then offset), so iteration is
/// deterministic regardless of how the parallel build interleaved.
#[derive(Debug, Clone)]
pub struct KmerPool {
    k: usize,
    sources: Vec<String>,
    kmers: Vec<Vec<u8>>,
    occurrences: Vec<Vec<Occurrence>>,
    ids: HashMap<Vec<u8>, usize>,
}

impl KmerPool {
    pub fn k(&self) -> usize {
        self.k
    }

    /// Source identifiers, indexed by `Occurrence::source`.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Number of distinct k-mers.
    pub fn len(&self) -> usize {
        self.kmers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kmers.is_empty()
    }

    /// Total occurrences across all k-mers and sources.
    pub fn total_occurrences(&self) -> usize {
        self.occurrences.iter().map(Vec::len).sum()
    }

    pub fn get(&self, kmer: &[u8]) -> Option<&[Occurrence]> {
        self.ids.get(kmer).map(|&id| self.occurrences[id].as_slice())
    }

    /// Distinct k-mers with their occurrences, in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[Occurrence])> {
        self.kmers
            .iter()
            .map(Vec::as_slice)
            .zip(self.occurrences.iter().map(Vec::as_slice))
    }

    /// Distinct k-mers in first-occurrence order.
    pub fn kmers(&self) -> impl Iterator<Item = &[u8]> {
        self.kmers.iter().map(Vec::as_slice)
    }

    /// Nested `kmer -> source id -> [[start, end], ...]` view used for the JSON dump.
    pub fn to_report(&self) -> BTreeMap<String, BTreeMap<String, Vec<[usize; 2]>>> {
        let mut report = BTreeMap::new();
        for (kmer, occurrences) in self.iter() {
            let mut by_source: BTreeMap<String, Vec<[usize; 2]>> = BTreeMap::new();
            for occ in occurrences {
                by_source
                    .entry(self.sources[occ.source].clone())
                    .or_default()
                    .push([occ.start, occ.start + self.k]);
            }
            report.insert(to_display(kmer), by_source);
        }
        report
    }
}

/// Builds a `KmerPool` from a set of sources with a fixed window width.
#[derive(Debug, Clone, Copy)]
pub struct KmerIndexer {
    k: usize,
}

impl KmerIndexer {
    pub fn new(k: usize) -> Result<Self, ViromeError> {
        if k == 0 {
            return Err(ViromeError::InvalidKmerSize(k));
        }
        Ok(KmerIndexer { k })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Indexes every source in parallel. Sources shorter than `k` contribute nothing.
    pub fn index<S: SequenceSource>(&self, sources: &[S]) -> KmerPool {
        let k = self.k;
        let table: DashMap<Vec<u8>, Vec<Occurrence>> = DashMap::new();

        sources.par_iter().enumerate().for_each(|(source, record)| {
            for (start, kmer) in kmer_windows(record.sequence(), k) {
                let occ = Occurrence { source, start };
                if let Some(mut entry) = table.get_mut(kmer) {
                    entry.push(occ);
                    continue;
                }
                table.entry(kmer.to_vec()).or_default().push(occ);
            }
        });

        let mut entries: Vec<(Vec<u8>, Vec<Occurrence>)> = table
            .into_iter()
            .map(|(kmer, mut occurrences)| {
                occurrences.sort_unstable();
                (kmer, occurrences)
            })
            .collect();
        // Every entry holds at least one occurrence, and first occurrences are unique.
        entries.sort_unstable_by_key(|(_, occurrences)| occurrences[0]);

        let mut pool = KmerPool {
            k,
            sources: sources.iter().map(|s| s.source_id().to_string()).collect(),
            kmers: Vec::with_capacity(entries.len()),
            occurrences: Vec::with_capacity(entries.len()),
            ids: HashMap::with_capacity(entries.len()),
        };
        for (id, (kmer, occurrences)) in entries.into_iter().enumerate() {
            pool.ids.insert(kmer.clone(), id);
            pool.kmers.push(kmer);
            pool.occurrences.push(occurrences);
        }

        debug!(
            "Indexed {} sources with k={}: {} distinct k-mers, {} occurrences",
            pool.sources.len(),
            k,
            pool.len(),
            pool.total_occurrences()
        );
        pool
    }

    /// Indexes a single sequence, e.g. one reference.
    pub fn index_one<S: SequenceSource>(&self, source: &S) -> KmerPool {
        self.index(std::slice::from_ref(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reads(seqs: &[(&str, &str)]) -> Vec<Read> {
        seqs.iter().map(|(id, s)| Read::new(*id, s.as_bytes())).collect()
    }

    #[test]
    fn test_rejects_zero_k() {
        assert!(matches!(
            KmerIndexer::new(0),
            Err(ViromeError::InvalidKmerSize(0))
        ));
    }

    #[test]
    fn test_index_single_read_counts() {
        let indexer = KmerIndexer::new(3).unwrap();
        let pool = indexer.index(&reads(&[("r1", "ACGTACGT")]));

        assert_eq!(pool.total_occurrences(), 6);
        assert_eq!(pool.len(), 4);
        let acg: Vec<usize> = pool.get(b"ACG").unwrap().iter().map(|o| o.start).collect();
        assert_eq!(acg, vec![0, 4]);
        let cgt: Vec<usize> = pool.get(b"CGT").unwrap().iter().map(|o| o.start).collect();
        assert_eq!(cgt, vec![1, 5]);
        assert_eq!(pool.get(b"GTA").unwrap().len(), 1);
        assert_eq!(pool.get(b"TAC").unwrap().len(), 1);
        assert!(pool.get(b"AAA").is_none());
    }

    #[test]
    fn test_kmers_in_first_occurrence_order() {
        let indexer = KmerIndexer::new(3).unwrap();
        let pool = indexer.index(&reads(&[("r1", "ACGTACGT"), ("r2", "TTTACG")]));
        let order: Vec<&[u8]> = pool.kmers().collect();
        let expected: Vec<&[u8]> = vec![
            &b"ACG"[..],
            &b"CGT"[..],
            &b"GTA"[..],
            &b"TAC"[..],
            &b"TTT"[..],
            &b"TTA"[..],
        ];
        assert_eq!(order, expected);
    }

    #[test]
    fn test_offsets_contiguous_per_source() {
        let indexer = KmerIndexer::new(4).unwrap();
        let seq = "GATTACAGATTACCA";
        let pool = indexer.index(&reads(&[("r1", seq)]));
        let mut starts: Vec<usize> = pool
            .iter()
            .flat_map(|(_, occs)| occs.iter().map(|o| o.start))
            .collect();
        starts.sort_unstable();
        let expected: Vec<usize> = (0..=seq.len() - 4).collect();
        assert_eq!(starts, expected);
    }

    #[test]
    fn test_short_sources_contribute_nothing() {
        let indexer = KmerIndexer::new(5).unwrap();
        let pool = indexer.index(&reads(&[("short", "ACG"), ("exact", "ACGTA")]));
        assert_eq!(pool.total_occurrences(), 1);
        assert_eq!(pool.get(b"ACGTA").unwrap()[0].source, 1);

        let empty = indexer.index::<Read>(&[]);
        assert!(empty.is_empty());
        assert_eq!(empty.total_occurrences(), 0);
    }

    #[test]
    fn test_independent_of_input_order() {
        let indexer = KmerIndexer::new(3).unwrap();
        let forward = indexer.index(&reads(&[("a", "ACGTT"), ("b", "CGTTA")]));
        let backward = indexer.index(&reads(&[("b", "CGTTA"), ("a", "ACGTT")]));
        assert_eq!(forward.to_report(), backward.to_report());
    }

    #[test]
    fn test_report_shape() {
        let indexer = KmerIndexer::new(3).unwrap();
        let pool = indexer.index(&reads(&[("r1", "ACGACG")]));
        let report = pool.to_report();
        assert_eq!(report["ACG"]["r1"], vec![[0, 3], [3, 6]]);
        assert_eq!(report["GAC"]["r1"], vec![[2, 5]]);
    }

    #[test]
    fn test_index_one_virus() {
        let indexer = KmerIndexer::new(2).unwrap();
        let pool = indexer.index_one(&Virus::new("v", "AAAT"));
        assert_eq!(pool.sources(), &["v".to_string()]);
        let aa: Vec<usize> = pool.get(b"AA").unwrap().iter().map(|o| o.start).collect();
        assert_eq!(aa, vec![0, 1]);
        assert_eq!(pool.get(b"AT").unwrap()[0].start, 2);
    }
}
