// K-mer processing logic
//
// K-mers are kept as literal byte slices: no case folding, no ambiguity-code handling.
// An `N` in a read is just another symbol and only matches another `N`.

use std::collections::HashSet;

/// Number of k-mers a sequence of length `len` yields for width `k`.
/// Zero when the sequence is shorter than `k` or when `k` is zero.
#[inline]
pub fn kmer_count(len: usize, k: usize) -> usize {
    if k == 0 || len < k { 0 } else { len - k + 1 }
}

/// Slides a window of width `k` over `seq`, yielding `(start, kmer)` pairs.
/// Start offsets are 0-based and contiguous. A sequence shorter than `k`
/// yields nothing.
pub fn kmer_windows(seq: &[u8], k: usize) -> impl Iterator<Item = (usize, &[u8])> {
    // slice::windows panics on 0, so an empty range stands in for it.
    let windows = if k == 0 || seq.len() < k {
        seq[..0].windows(1)
    } else {
        seq.windows(k)
    };
    windows.enumerate()
}

/// Distinct k-mers of `seq` in first-occurrence order, each paired with the
/// start offset of that first occurrence.
pub fn first_occurrences(seq: &[u8], k: usize) -> Vec<(usize, &[u8])> {
    let mut seen: HashSet<&[u8]> = HashSet::with_capacity(kmer_count(seq.len(), k));
    kmer_windows(seq, k)
        .filter(|(_, kmer)| seen.insert(*kmer))
        .collect()
}

/// The (k-1)-length prefix node of a k-mer.
#[inline]
pub fn prefix(kmer: &[u8]) -> &[u8] {
    &kmer[..kmer.len().saturating_sub(1)]
}

/// The (k-1)-length suffix node of a k-mer.
#[inline]
pub fn suffix(kmer: &[u8]) -> &[u8] {
    if kmer.is_empty() { kmer } else { &kmer[1..] }
}

/// Counts mismatched aligned positions between two sequences.
/// Sequences of different lengths also count every unpaired trailing position
/// as a mismatch, which keeps the distance symmetric.
pub fn hamming_distance(a: &[u8], b: &[u8]) -> usize {
    let mismatches = a.iter().zip(b).filter(|(x, y)| x != y).count();
    mismatches + a.len().abs_diff(b.len())
}

/// Hamming distance bounded by `max`: returns the exact distance when it is
/// `<= max`, `None` as soon as it is known to exceed `max`.
#[inline]
pub fn hamming_within(a: &[u8], b: &[u8], max: usize) -> Option<usize> {
    let mut distance = a.len().abs_diff(b.len());
    if distance > max {
        return None;
    }
    for (x, y) in a.iter().zip(b) {
        if x != y {
            distance += 1;
            if distance > max {
                return None;
            }
        }
    }
    Some(distance)
}

/// Lossy conversion of a k-mer or sequence to `String` for reporting.
pub fn to_display(seq: &[u8]) -> String {
    String::from_utf8_lossy(seq).into_owned()
}
