use anyhow::{Context, Result};
use log::info;
use std::{collections::BTreeMap, fs, path::Path};

use crate::{
    abundance::{virus_abundance, VirusAbundance},
    cli::DetectArgs,
    commands::assemble::log_timings,
    pipeline::{run, DetectionConfig, DetectionOutput},
    utils::{
        get_output_writer, load_reads, load_viruses, track_progress_and_resources, write_json,
    },
};

fn write_abundance_tsv(path: &Path, abundances: &[VirusAbundance]) -> Result<()> {
    info!("Writing virus abundance TSV to: {:?}", path);
    let writer = get_output_writer(path)
        .with_context(|| format!("Failed to get output writer for TSV file: {:?}", path))?;
    let mut tsv_writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);

    tsv_writer.write_record(["Virus", "NumContigsInVirus", "TotalContigs", "RelativeAbundance"])?;
    for abundance in abundances {
        tsv_writer.write_record(&[
            abundance.virus.clone(),
            abundance.num_contigs_in_virus.to_string(),
            abundance.total_contigs.to_string(),
            format!("{:.4}", abundance.abundance),
        ])?;
    }
    tsv_writer.flush()?;
    Ok(())
}

fn dump_pools(dir: &Path, output: &DetectionOutput) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create k-mer pool directory: {:?}", dir))?;

    write_json(&dir.join("r-kmerPool.json"), &output.assembly.read_pool.to_report())?;

    let virus_pools: BTreeMap<&str, _> = output
        .results
        .iter()
        .zip(&output.virus_pools)
        .map(|(result, pool)| (result.virus.as_str(), pool.to_report()))
        .collect();
    write_json(&dir.join("v-kmerPool.json"), &virus_pools)?;

    info!("Wrote k-mer pools to {:?}", dir);
    Ok(())
}

// Abundance is undefined without contigs; computed before any output is written.
fn requested_abundance(
    requested: bool,
    output: &DetectionOutput,
) -> Result<Option<Vec<VirusAbundance>>> {
    if !requested {
        return Ok(None);
    }
    Ok(Some(virus_abundance(
        &output.results,
        output.assembly.contigs.len(),
    )?))
}

pub fn run_detect(args: DetectArgs) -> Result<()> {
    info!("Starting detect command with args: {:?}", args);

    let reads = load_reads(&args.reads)?;
    let viruses = load_viruses(&args.virus_files)?;
    let config =
        DetectionConfig::new(args.kmer_size).with_max_hamming_distance(args.max_hamming_distance);
    info!(
        "Size of k = {}, maximum Hamming distance = {}",
        config.k, config.max_hamming_distance
    );

    let output = track_progress_and_resources(
        "Searching for viruses",
        viruses.len() as u64,
        |pb| {
            let output = run(&reads, &viruses, config)?;
            pb.set_position(viruses.len() as u64);
            Ok(output)
        },
    )?;
    log_timings(&output.timings);

    for (result, virus) in output.results.iter().zip(&viruses) {
        info!(
            "{} contigs align with {} ({} bp)",
            result.num_contigs_in_virus,
            result.virus,
            virus.sequence.len()
        );
    }

    let abundances = requested_abundance(args.abundance_tsv.is_some(), &output)?;

    write_json(&args.output_file, &output.results).with_context(|| {
        format!("Failed to write detection results to {:?}", args.output_file)
    })?;
    info!("Successfully wrote detection results to {:?}", args.output_file);

    if let (Some(tsv_path), Some(abundances)) = (&args.abundance_tsv, &abundances) {
        write_abundance_tsv(tsv_path, abundances)?;
        info!("Abundance TSV successfully written to {:?}", tsv_path);
    }

    if let Some(dir) = &args.dump_pools {
        dump_pools(dir, &output)?;
    }

    Ok(())
}
