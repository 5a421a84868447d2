//! Batch pipeline: reads -> k-mer pool -> de Bruijn graph -> contigs -> virus matches.
//!
//! Each stage consumes the previous stage's output read-only. Stage durations
//! are returned to the caller in `StageTimings` instead of being logged here.

use std::time::{Duration, Instant};

use crate::{
    assembler::ContigAssembler,
    errors::ViromeError,
    graph::{DeBruijnGraph, DeBruijnGraphBuilder},
    indexer::{KmerIndexer, KmerPool},
    matcher::{DEFAULT_MAX_HAMMING_DISTANCE, VirusMatcher},
    types::{Contig, Read, Virus, VirusDetectionResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionConfig {
    pub k: usize,
    pub max_hamming_distance: usize,
}

impl DetectionConfig {
    pub fn new(k: usize) -> Self {
        DetectionConfig {
            k,
            max_hamming_distance: DEFAULT_MAX_HAMMING_DISTANCE,
        }
    }

    pub fn with_max_hamming_distance(mut self, max_hamming_distance: usize) -> Self {
        self.max_hamming_distance = max_hamming_distance;
        self
    }
}

/// Read-length statistics of the (already cleaned) sample.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SampleSummary {
    pub num_reads: usize,
    pub min_read_length: Option<usize>,
    pub max_read_length: Option<usize>,
    pub average_read_length: f64,
}

impl SampleSummary {
    pub fn from_reads(reads: &[Read]) -> Self {
        let lengths = reads.iter().map(|r| r.sequence.len());
        let total: usize = lengths.clone().sum();
        SampleSummary {
            num_reads: reads.len(),
            min_read_length: lengths.clone().min(),
            max_read_length: lengths.max(),
            average_read_length: if reads.is_empty() {
                0.0
            } else {
                total as f64 / reads.len() as f64
            },
        }
    }
}

/// `k` must be positive and at most the shortest read length minus 2.
/// An empty sample places no upper bound on `k`.
pub fn validate_k(k: usize, summary: &SampleSummary) -> Result<(), ViromeError> {
    if k == 0 {
        return Err(ViromeError::InvalidKmerSize(k));
    }
    if let Some(min_read_length) = summary.min_read_length {
        if k + 2 > min_read_length {
            return Err(ViromeError::KmerExceedsReadLength { k, min_read_length });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTimings {
    pub indexing: Duration,
    pub graph: Duration,
    pub assembly: Duration,
    pub matching: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.indexing + self.graph + self.assembly + self.matching
    }
}

#[derive(Debug, Clone)]
pub struct AssemblyOutput {
    pub summary: SampleSummary,
    pub read_pool: KmerPool,
    pub graph: DeBruijnGraph,
    pub contigs: Vec<Contig>,
    pub timings: StageTimings,
}

#[derive(Debug, Clone)]
pub struct DetectionOutput {
    pub assembly: AssemblyOutput,
    pub virus_pools: Vec<KmerPool>,
    pub results: Vec<VirusDetectionResult>,
    pub timings: StageTimings,
}

/// Validates `k` against the sample, then indexes, builds the graph and assembles.
pub fn assemble_reads(reads: &[Read], k: usize) -> Result<AssemblyOutput, ViromeError> {
    let summary = SampleSummary::from_reads(reads);
    validate_k(k, &summary)?;
    let mut timings = StageTimings::default();

    let started = Instant::now();
    let read_pool = KmerIndexer::new(k)?.index(reads);
    timings.indexing = started.elapsed();

    let started = Instant::now();
    let graph = DeBruijnGraphBuilder::from_pool(&read_pool)?;
    timings.graph = started.elapsed();

    let started = Instant::now();
    let contigs = ContigAssembler::assemble(&graph)?;
    timings.assembly = started.elapsed();

    Ok(AssemblyOutput {
        summary,
        read_pool,
        graph,
        contigs,
        timings,
    })
}

/// Full run: assembly followed by matching every virus against every contig.
pub fn run(
    reads: &[Read],
    viruses: &[Virus],
    config: DetectionConfig,
) -> Result<DetectionOutput, ViromeError> {
    let matcher = VirusMatcher::new(config.k, config.max_hamming_distance)?;
    let assembly = assemble_reads(reads, config.k)?;
    let mut timings = assembly.timings;

    let started = Instant::now();
    let virus_pools = matcher.virus_pools(viruses);
    let results = matcher.detect_with_pools(viruses, &virus_pools, &assembly.contigs)?;
    timings.matching = started.elapsed();

    Ok(DetectionOutput {
        assembly,
        virus_pools,
        results,
        timings,
    })
}
