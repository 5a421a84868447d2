use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::matcher::DEFAULT_MAX_HAMMING_DISTANCE;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Metagenomic virome characterization from assembled k-mers", long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    #[clap(
        short,
        long,
        global = true,
        default_value_t = 0,
        help = "Number of threads to use (0 for all logical cores)"
    )]
    pub threads: usize,

    #[clap(short, long, global = true, action = clap::ArgAction::Count, help = "Verbosity level (e.g., -v, -vv)")]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index read k-mers and write the k-mer pool as JSON
    Index(IndexArgs),
    /// Assemble reads into contigs through a de Bruijn graph
    Assemble(AssembleArgs),
    /// Assemble reads and detect reference sequences among the contigs
    Detect(DetectArgs),
}

#[derive(Parser, Debug)]
pub struct IndexArgs {
    #[clap(short, long, required = true, help = "The length of the k-mer")]
    pub kmer_size: usize,

    #[clap(
        short,
        long,
        required = true,
        help = "Quality-controlled reads (FASTQ). Supports .gz, .xz, .zst compression."
    )]
    pub reads: PathBuf,

    #[clap(
        short,
        long,
        required = true,
        help = "Output file for the k-mer pool (JSON). Supports .gz, .xz, .zst compression based on extension."
    )]
    pub output_file: PathBuf,
}

#[derive(Parser, Debug)]
pub struct AssembleArgs {
    #[clap(short, long, required = true, help = "The length of the k-mer")]
    pub kmer_size: usize,

    #[clap(
        short,
        long,
        required = true,
        help = "Quality-controlled reads (FASTQ). Supports .gz, .xz, .zst compression."
    )]
    pub reads: PathBuf,

    #[clap(
        short,
        long,
        required = true,
        help = "Output file for contigs (FASTA). Supports .gz, .xz, .zst compression based on extension."
    )]
    pub output_file: PathBuf,
}

#[derive(Parser, Debug)]
pub struct DetectArgs {
    #[clap(short, long, required = true, help = "The length of the k-mer")]
    pub kmer_size: usize,

    #[clap(
        short,
        long,
        required = true,
        help = "Quality-controlled reads (FASTQ). Supports .gz, .xz, .zst compression."
    )]
    pub reads: PathBuf,

    #[clap(
        short = 'R',
        long = "references",
        required = true,
        num_args = 1..,
        help = "One or more reference sequence files (FASTA). Supports .gz, .xz, .zst compression."
    )]
    pub virus_files: Vec<PathBuf>,

    #[clap(
        short,
        long,
        required = true,
        help = "Output file for detection results (JSON). Supports .gz, .xz, .zst compression based on extension."
    )]
    pub output_file: PathBuf,

    #[clap(
        short = 'm',
        long = "max-hamming",
        default_value_t = DEFAULT_MAX_HAMMING_DISTANCE,
        help = "Maximum Hamming distance between a reference k-mer and a contig k-mer"
    )]
    pub max_hamming_distance: usize,

    #[clap(
        long,
        help = "Optional: Output file path for a TSV of relative virus abundance. Supports .gz, .xz, .zst compression based on extension."
    )]
    pub abundance_tsv: Option<PathBuf>,

    #[clap(
        long,
        help = "Optional: Directory to write the read and reference k-mer pools to (JSON)"
    )]
    pub dump_pools: Option<PathBuf>,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
