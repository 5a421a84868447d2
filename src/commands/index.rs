use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::IndexArgs,
    indexer::KmerIndexer,
    pipeline::{validate_k, SampleSummary},
    utils::{load_reads, track_progress_and_resources, write_json},
};

pub fn run_index(args: IndexArgs) -> Result<()> {
    info!("Starting index command with args: {:?}", args);

    let reads = load_reads(&args.reads)?;
    let summary = SampleSummary::from_reads(&reads);
    validate_k(args.kmer_size, &summary)?;
    let k = args.kmer_size;

    let pool = track_progress_and_resources("Indexing read k-mers", reads.len() as u64, |pb| {
        let pool = KmerIndexer::new(k)?.index(&reads);
        pb.set_position(reads.len() as u64);
        Ok(pool)
    })?;

    info!(
        "Indexed {} reads: {} distinct k-mers, {} occurrences (k={})",
        summary.num_reads,
        pool.len(),
        pool.total_occurrences(),
        k
    );

    write_json(&args.output_file, &pool.to_report())
        .with_context(|| format!("Failed to write k-mer pool to {:?}", args.output_file))?;
    info!("Successfully wrote k-mer pool to {:?}", args.output_file);

    Ok(())
}
