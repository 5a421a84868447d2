use anyhow::{Context, Result};
use flate2::{write::GzEncoder, Compression as GzCompression};
use log::{debug, info, warn};
use needletail::parse_fastx_file;
use serde::Serialize;
use std::{
    collections::HashSet,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use xz2::write::XzEncoder;
use zstd::stream::write::Encoder as ZstdEncoder;

use crate::types::{Contig, Read, Virus};

/// Determines the number of threads to use.
/// If `cli_threads` is 0, it uses all available logical cores.
/// Otherwise, it uses the number specified in `cli_threads`.
pub fn get_num_threads(cli_threads: usize) -> usize {
    let num_threads = if cli_threads == 0 {
        num_cpus::get()
    } else {
        cli_threads
    };
    debug!("Using {} threads for processing.", num_threads);
    num_threads
}

/// Initializes the Rayon global thread pool with the specified number of threads.
pub fn initialize_rayon_pool(num_threads: usize) -> Result<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;
    Ok(())
}

use indicatif::{ProgressBar, ProgressStyle};
use psutil::process::Process;
use std::time::Instant;

/// Wraps a function to provide progress tracking, execution time, and max RAM usage.
pub fn track_progress_and_resources<F, R>(
    task_description: &str,
    total_items: u64,
    func: F,
) -> Result<R>
where
    F: FnOnce(&ProgressBar) -> Result<R>,
{
    info!("Starting task: {}", task_description);
    let start_time = Instant::now();

    let pb = ProgressBar::new(total_items);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|e| {
                debug!("Error setting progress bar style: {}", e);
                ProgressStyle::default_bar()
            })
            .progress_chars("#>-"),
    );

    let result = func(&pb);

    pb.finish_with_message(format!("{} completed.", task_description));

    let duration = start_time.elapsed();
    info!("Task '{}' finished in {:.2?}", task_description, duration);

    match Process::current() {
        Ok(process) => match process.memory_info() {
            Ok(mem_info) => {
                info!(
                    "Max RAM usage for task '{}': {} MB",
                    task_description,
                    mem_info.rss() / 1024 / 1024
                );
            }
            Err(e) => {
                debug!("Failed to get memory info: {}", e);
            }
        },
        Err(e) => {
            debug!("Failed to get current process: {}", e);
        }
    }

    result
}

// First whitespace-delimited token of a FASTA/FASTQ header.
fn header_name(id: &[u8]) -> String {
    String::from_utf8_lossy(id)
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Loads every record of a FASTQ (or FASTA) sample as a `Read`.
/// Sequences are kept exactly as written; compression is detected by needletail.
pub fn load_reads(path: &Path) -> Result<Vec<Read>> {
    let path_str = path.to_string_lossy();
    let mut reader = parse_fastx_file(path)
        .with_context(|| format!("Failed to open or parse file: {}", path_str))?;

    let mut reads = Vec::new();
    while let Some(record) = reader.next() {
        let record = record.with_context(|| format!("Error reading record from {}", path_str))?;
        reads.push(Read {
            id: header_name(record.id()),
            sequence: record.seq().into_owned(),
            quality: record.qual().map(<[u8]>::to_vec).unwrap_or_default(),
        });
        if reads.len() % 100_000 == 0 {
            debug!("Loaded {} reads from {}", reads.len(), path_str);
        }
    }
    info!("Loaded {} reads from {}", reads.len(), path_str);
    Ok(reads)
}

/// Loads reference sequences from one or more FASTA files. Each record becomes
/// one `Virus`; a name seen earlier keeps its first sequence.
pub fn load_viruses(paths: &[impl AsRef<Path>]) -> Result<Vec<Virus>> {
    let mut viruses = Vec::new();
    let mut names = HashSet::new();
    for path in paths {
        let path = path.as_ref();
        let path_str = path.to_string_lossy();
        let mut reader = parse_fastx_file(path)
            .with_context(|| format!("Failed to open or parse file: {}", path_str))?;
        while let Some(record) = reader.next() {
            let record =
                record.with_context(|| format!("Error reading record from {}", path_str))?;
            let name = header_name(record.id());
            if !names.insert(name.clone()) {
                warn!("Duplicate reference name '{}' in {}; keeping the first", name, path_str);
                continue;
            }
            viruses.push(Virus {
                name,
                sequence: record.seq().into_owned(),
            });
        }
    }
    info!("Loaded {} reference sequences", viruses.len());
    Ok(viruses)
}

/// Serializes `value` as pretty JSON to `path` (compressed by extension).
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = get_output_writer(path)
        .with_context(|| format!("Failed to get output writer for JSON file: {:?}", path))?;
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write JSON to {:?}", path))?;
    writer.flush().context("Failed to flush JSON output writer")?;
    Ok(())
}

/// Writes contigs as FASTA, one line per sequence.
pub fn write_contigs_fasta(path: &Path, contigs: &[Contig]) -> Result<()> {
    let mut writer = get_output_writer(path)
        .with_context(|| format!("Failed to get output writer for FASTA file: {:?}", path))?;
    for contig in contigs {
        writeln!(writer, ">contig_{} length={}", contig.id, contig.length())
            .context("Failed to write contig header")?;
        writer
            .write_all(&contig.sequence)
            .context("Failed to write contig sequence")?;
        writer.write_all(b"\n")?;
    }
    writer.flush().context("Failed to flush FASTA output writer")?;
    Ok(())
}

// Helper function to get file extension as lowercase string
fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
}

/// Opens a file for writing, handling compression based on file extension.
/// Supported extensions: .gz, .xz, .zst.
/// Returns a `Box<dyn Write>` for generic writing.
pub fn get_output_writer(path: &Path) -> Result<Box<dyn Write>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {:?}", path))?;
    let extension = get_extension(path);

    match extension.as_deref() {
        Some("gz") => {
            info!("Writing GZipped file: {:?}", path);
            let encoder = GzEncoder::new(file, GzCompression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        Some("xz") => {
            info!("Writing XZ compressed file: {:?}", path);
            let encoder = XzEncoder::new(file, 6);
            Ok(Box::new(BufWriter::new(encoder)))
        }
        Some("zst") | Some("zstd") => {
            info!("Writing Zstandard compressed file: {:?}", path);
            let encoder = ZstdEncoder::new(file, 0) // 0 is default compression level for zstd crate
                .with_context(|| format!("Failed to create ZstdEncoder for {:?}", path))?
                .auto_finish(); // Ensures finish is called on drop
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => {
            info!("Writing uncompressed file: {:?}", path);
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read as _;
    use tempfile::TempDir;

    #[test]
    fn test_get_num_threads() {
        assert_eq!(get_num_threads(3), 3);
        assert!(get_num_threads(0) >= 1);
    }

    #[test]
    fn test_header_name() {
        assert_eq!(header_name(b"read1 length=150"), "read1");
        assert_eq!(header_name(b"virus_A"), "virus_A");
        assert_eq!(header_name(b""), "");
    }

    #[test]
    fn test_load_reads_fastq() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.fastq");
        fs::write(&path, "@r1 extra\nACGTacgN\n+\nIIIIIIII\n@r2\nGATTACA\n+\nIIIIIII\n").unwrap();
        let reads = load_reads(&path).unwrap();
        assert_eq!(reads.len(), 2);
        assert_eq!(reads[0].id, "r1");
        // No normalization of case or ambiguity codes.
        assert_eq!(reads[0].sequence, b"ACGTacgN".to_vec());
        assert_eq!(reads[0].quality, b"IIIIIIII".to_vec());
        assert_eq!(reads[1].sequence, b"GATTACA".to_vec());
    }

    #[test]
    fn test_load_viruses_keeps_first_duplicate() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("a.fasta");
        let second = dir.path().join("b.fasta");
        fs::write(&first, ">v1 desc\nACGT\nACGT\n>v2\nTTTT\n").unwrap();
        fs::write(&second, ">v1\nGGGG\n>v3\nCCCC\n").unwrap();
        let viruses = load_viruses(&[first, second]).unwrap();
        let names: Vec<&str> = viruses.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["v1", "v2", "v3"]);
        assert_eq!(viruses[0].sequence, b"ACGTACGT".to_vec());
    }

    #[test]
    fn test_load_reads_missing_file() {
        let err = load_reads(Path::new("definitely_missing.fastq")).unwrap_err();
        assert!(err.to_string().contains("Failed to open or parse file"));
    }

    #[test]
    fn test_gz_output_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contigs.fa.gz");
        let contigs = vec![Contig {
            id: 1,
            sequence: b"ACGTAC".to_vec(),
        }];
        write_contigs_fasta(&path, &contigs).unwrap();

        let mut text = String::new();
        flate2::read::MultiGzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, ">contig_1 length=6\nACGTAC\n");
    }
}
