use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::ops::Range;

use crate::kmer::to_display;

/// One sequencing record, already quality-controlled upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Read {
    pub id: String,
    pub sequence: Vec<u8>,
    pub quality: Vec<u8>,
}

impl Read {
    pub fn new(id: impl Into<String>, sequence: impl Into<Vec<u8>>) -> Self {
        Read {
            id: id.into(),
            sequence: sequence.into(),
            quality: Vec::new(),
        }
    }
}

/// A reference ("virus") sequence to search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Virus {
    pub name: String,
    pub sequence: Vec<u8>,
}

impl Virus {
    pub fn new(name: impl Into<String>, sequence: impl Into<Vec<u8>>) -> Self {
        Virus {
            name: name.into(),
            sequence: sequence.into(),
        }
    }
}

/// An assembled unitig. Ids start at 1 and follow discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contig {
    pub id: usize,
    pub sequence: Vec<u8>,
}

impl Contig {
    pub fn length(&self) -> usize {
        self.sequence.len()
    }
}

/// A virus k-mer found within the Hamming bound of some contig k-mer.
///
/// Serialized as a single-entry map keyed by the virus k-mer, the shape
/// reporting layers consume:
/// `{"ACG": {"indexOfVKmerInContig": [0, 3], "hammingDistance": 0, "kmerLength": 3}}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VKmerMatch {
    pub virus_kmer: String,
    /// Range of the first occurrence of the matched contig k-mer.
    pub contig_range: Range<usize>,
    pub hamming_distance: usize,
    pub kmer_length: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VKmerMatchBody {
    index_of_v_kmer_in_contig: [usize; 2],
    hamming_distance: usize,
    kmer_length: usize,
}

impl Serialize for VKmerMatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(
            &self.virus_kmer,
            &VKmerMatchBody {
                index_of_v_kmer_in_contig: [self.contig_range.start, self.contig_range.end],
                hamming_distance: self.hamming_distance,
                kmer_length: self.kmer_length,
            },
        )?;
        map.end()
    }
}

/// Per-contig summary against one virus.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContigInfo {
    pub contig_id: usize,
    pub contig: String,
    pub length: usize,
    #[serde(rename = "v-kmers")]
    pub v_kmers: Vec<VKmerMatch>,
    pub kmer_count: usize,
}

impl ContigInfo {
    pub fn new(contig: &Contig) -> Self {
        ContigInfo {
            contig_id: contig.id,
            contig: to_display(&contig.sequence),
            length: contig.length(),
            v_kmers: Vec::new(),
            kmer_count: 0,
        }
    }

    pub fn record(&mut self, found: VKmerMatch) {
        self.v_kmers.push(found);
        self.kmer_count += 1;
    }
}

/// Detection outcome for a single virus.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VirusDetectionResult {
    pub virus: String,
    pub num_contigs_in_virus: usize,
    pub contigs_in_virus: Vec<ContigInfo>,
    pub contigs_tested: Vec<ContigInfo>,
}

impl VirusDetectionResult {
    /// Splits the tested contigs into the matched subset. Every contig stays in
    /// `contigs_tested`; only those with at least one k-mer hit are copied into
    /// `contigs_in_virus`.
    pub fn from_tested(virus: String, contigs_tested: Vec<ContigInfo>) -> Self {
        let contigs_in_virus: Vec<ContigInfo> = contigs_tested
            .iter()
            .filter(|info| info.kmer_count > 0)
            .cloned()
            .collect();
        VirusDetectionResult {
            virus,
            num_contigs_in_virus: contigs_in_virus.len(),
            contigs_in_virus,
            contigs_tested,
        }
    }
}
