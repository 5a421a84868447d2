use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViromeError {
    #[error("Invalid K-mer size: {0}. Must be at least 1.")]
    InvalidKmerSize(usize),

    #[error(
        "K-mer size {k} is too large: k must be at most the minimum read length minus 2 (minimum read length is {min_read_length})"
    )]
    KmerExceedsReadLength { k: usize, min_read_length: usize },

    #[error("K-mer sizes do not match: expected {0}, found {1}")]
    KmerSizeMismatch(usize, usize),

    #[error("Expected one k-mer pool per virus: {viruses} viruses, {pools} pools")]
    PoolCountMismatch { viruses: usize, pools: usize },

    #[error("De Bruijn graph is inconsistent at k-mer {kmer}: {reason}")]
    GraphInconsistency { kmer: String, reason: String },

    #[error("Cannot compute abundance: no contigs were assembled")]
    EmptyContigSet,
}
