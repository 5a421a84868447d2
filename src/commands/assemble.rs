use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::AssembleArgs,
    pipeline::{assemble_reads, StageTimings},
    utils::{load_reads, track_progress_and_resources, write_contigs_fasta},
};

pub(crate) fn log_timings(timings: &StageTimings) {
    info!("Reads to k-mers finished in {:.2?}", timings.indexing);
    info!("De Bruijn graph finished in {:.2?}", timings.graph);
    info!("Create contigs finished in {:.2?}", timings.assembly);
    if !timings.matching.is_zero() {
        info!("Find viruses finished in {:.2?}", timings.matching);
    }
    info!("All stages finished in {:.2?}", timings.total());
}

pub fn run_assemble(args: AssembleArgs) -> Result<()> {
    info!("Starting assemble command with args: {:?}", args);

    let reads = load_reads(&args.reads)?;

    let assembly = track_progress_and_resources("Assembling contigs", 3, |pb| {
        let assembly = assemble_reads(&reads, args.kmer_size)?;
        pb.set_position(3);
        Ok(assembly)
    })?;
    log_timings(&assembly.timings);

    info!(
        "Assembled {} contigs from {} reads ({} nodes, {} edges)",
        assembly.contigs.len(),
        assembly.summary.num_reads,
        assembly.graph.node_count(),
        assembly.graph.edge_count()
    );

    write_contigs_fasta(&args.output_file, &assembly.contigs)
        .with_context(|| format!("Failed to write contigs to {:?}", args.output_file))?;
    info!("Successfully wrote contigs to {:?}", args.output_file);

    Ok(())
}
