//! De Bruijn graph over read k-mers.
//!
//! Nodes are distinct (k-1)-mers interned into an arena; edges are distinct
//! k-mers joining their prefix node to their suffix node. An edge carries the
//! total number of times its k-mer occurred across the read pool rather than
//! one edge per occurrence. Self-loops (prefix == suffix, e.g. `AAA`) are
//! ordinary edges.

use log::debug;
use std::collections::HashMap;

use crate::{
    errors::ViromeError,
    indexer::KmerPool,
    kmer::{prefix, suffix, to_display},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub kmer: Vec<u8>,
    pub multiplicity: usize,
}

/// Immutable graph produced by `DeBruijnGraphBuilder`.
#[derive(Debug, Clone)]
pub struct DeBruijnGraph {
    k: usize,
    nodes: Vec<Vec<u8>>,
    node_ids: HashMap<Vec<u8>, usize>,
    edges: Vec<Edge>,
    out_edges: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

impl DeBruijnGraph {
    /// Assembles a graph from an explicit node arena and edge list, checking
    /// that every edge points at nodes that exist and agree with its k-mer.
    pub fn from_parts(k: usize, nodes: Vec<Vec<u8>>, edges: Vec<Edge>) -> Result<Self, ViromeError> {
        validate_edges(k, &nodes, &edges)?;

        let node_ids = nodes
            .iter()
            .enumerate()
            .map(|(id, node)| (node.clone(), id))
            .collect();
        let mut out_edges = vec![Vec::new(); nodes.len()];
        let mut in_degree = vec![0; nodes.len()];
        for (id, edge) in edges.iter().enumerate() {
            out_edges[edge.from].push(id);
            in_degree[edge.to] += 1;
        }
        for outs in &mut out_edges {
            outs.sort_by(|&a, &b| edges[a].kmer.cmp(&edges[b].kmer));
        }

        Ok(DeBruijnGraph {
            k,
            nodes,
            node_ids,
            edges,
            out_edges,
            in_degree,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Sum of edge multiplicities; equals the number of k-mer occurrences indexed.
    pub fn total_multiplicity(&self) -> usize {
        self.edges.iter().map(|e| e.multiplicity).sum()
    }

    pub fn node(&self, id: usize) -> &[u8] {
        &self.nodes[id]
    }

    pub fn node_id(&self, node: &[u8]) -> Option<usize> {
        self.node_ids.get(node).copied()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: usize) -> &Edge {
        &self.edges[id]
    }

    /// Outgoing edge ids of a node, ordered by k-mer.
    pub fn out_edges(&self, node: usize) -> &[usize] {
        &self.out_edges[node]
    }

    pub fn out_degree(&self, node: usize) -> usize {
        self.out_edges[node].len()
    }

    pub fn in_degree(&self, node: usize) -> usize {
        self.in_degree[node]
    }

    /// One-in one-out: the node sits in the middle of a non-branching path.
    pub fn is_linear(&self, node: usize) -> bool {
        self.in_degree(node) == 1 && self.out_degree(node) == 1
    }

    /// Node ids ordered by their (k-1)-mer string.
    pub fn nodes_by_key(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = (0..self.nodes.len()).collect();
        ids.sort_by(|&a, &b| self.nodes[a].cmp(&self.nodes[b]));
        ids
    }

    /// Re-checks the node/edge invariants.
    pub fn validate(&self) -> Result<(), ViromeError> {
        validate_edges(self.k, &self.nodes, &self.edges)
    }
}

fn validate_edges(k: usize, nodes: &[Vec<u8>], edges: &[Edge]) -> Result<(), ViromeError> {
    let inconsistent = |edge: &Edge, reason: String| ViromeError::GraphInconsistency {
        kmer: to_display(&edge.kmer),
        reason,
    };

    for edge in edges {
        if edge.kmer.len() != k {
            return Err(inconsistent(
                edge,
                format!("edge length {} differs from k={}", edge.kmer.len(), k),
            ));
        }
        let Some(from) = nodes.get(edge.from) else {
            return Err(inconsistent(edge, format!("prefix node {} is missing", edge.from)));
        };
        let Some(to) = nodes.get(edge.to) else {
            return Err(inconsistent(edge, format!("suffix node {} is missing", edge.to)));
        };
        if from.as_slice() != prefix(&edge.kmer) {
            return Err(inconsistent(
                edge,
                format!("prefix node holds {}", to_display(from)),
            ));
        }
        if to.as_slice() != suffix(&edge.kmer) {
            return Err(inconsistent(
                edge,
                format!("suffix node holds {}", to_display(to)),
            ));
        }
    }
    Ok(())
}

/// Accumulates k-mers into node and edge tables.
#[derive(Debug, Default)]
pub struct DeBruijnGraphBuilder {
    k: usize,
    nodes: Vec<Vec<u8>>,
    node_ids: HashMap<Vec<u8>, usize>,
    edges: Vec<Edge>,
    edge_ids: HashMap<Vec<u8>, usize>,
}

impl DeBruijnGraphBuilder {
    pub fn new(k: usize) -> Result<Self, ViromeError> {
        if k == 0 {
            return Err(ViromeError::InvalidKmerSize(k));
        }
        Ok(DeBruijnGraphBuilder {
            k,
            ..Default::default()
        })
    }

    /// Builds the graph for every distinct k-mer in `pool`, scanning k-mers in
    /// lexicographic order so node and edge ids are reproducible.
    pub fn from_pool(pool: &KmerPool) -> Result<DeBruijnGraph, ViromeError> {
        let mut builder = DeBruijnGraphBuilder::new(pool.k())?;
        let mut kmers: Vec<(&[u8], usize)> =
            pool.iter().map(|(kmer, occs)| (kmer, occs.len())).collect();
        kmers.sort_unstable_by(|a, b| a.0.cmp(b.0));
        for (kmer, count) in kmers {
            builder.add_kmer(kmer, count)?;
        }
        let graph = builder.build()?;
        debug!(
            "Built de Bruijn graph: {} nodes, {} edges, total multiplicity {}",
            graph.node_count(),
            graph.edge_count(),
            graph.total_multiplicity()
        );
        Ok(graph)
    }

    fn intern(&mut self, node: &[u8]) -> usize {
        if let Some(&id) = self.node_ids.get(node) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(node.to_vec());
        self.node_ids.insert(node.to_vec(), id);
        id
    }

    /// Adds `count` occurrences of `kmer`. A k-mer seen before bumps the
    /// multiplicity of its existing edge.
    pub fn add_kmer(&mut self, kmer: &[u8], count: usize) -> Result<(), ViromeError> {
        if kmer.len() != self.k {
            return Err(ViromeError::KmerSizeMismatch(self.k, kmer.len()));
        }
        if let Some(&id) = self.edge_ids.get(kmer) {
            self.edges[id].multiplicity += count;
            return Ok(());
        }
        let from = self.intern(prefix(kmer));
        let to = self.intern(suffix(kmer));
        self.edge_ids.insert(kmer.to_vec(), self.edges.len());
        self.edges.push(Edge {
            from,
            to,
            kmer: kmer.to_vec(),
            multiplicity: count,
        });
        Ok(())
    }

    pub fn build(self) -> Result<DeBruijnGraph, ViromeError> {
        DeBruijnGraph::from_parts(self.k, self.nodes, self.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{indexer::KmerIndexer, types::Read};

    fn graph_for(k: usize, seqs: &[&str]) -> (KmerPool, DeBruijnGraph) {
        let reads: Vec<Read> = seqs
            .iter()
            .enumerate()
            .map(|(i, s)| Read::new(format!("r{}", i + 1), s.as_bytes()))
            .collect();
        let pool = KmerIndexer::new(k).unwrap().index(&reads);
        let graph = DeBruijnGraphBuilder::from_pool(&pool).unwrap();
        (pool, graph)
    }

    fn edge_for<'a>(graph: &'a DeBruijnGraph, kmer: &[u8]) -> &'a Edge {
        graph.edges().iter().find(|e| e.kmer == kmer).unwrap()
    }

    #[test]
    fn test_cycle_from_repeated_read() {
        let (_, graph) = graph_for(3, &["ACGTACGT"]);
        let mut nodes: Vec<&[u8]> = (0..graph.node_count()).map(|id| graph.node(id)).collect();
        nodes.sort();
        let expected: Vec<&[u8]> = vec![&b"AC"[..], &b"CG"[..], &b"GT"[..], &b"TA"[..]];
        assert_eq!(nodes, expected);

        assert_eq!(graph.edge_count(), 4);
        assert_eq!(edge_for(&graph, b"ACG").multiplicity, 2);
        assert_eq!(edge_for(&graph, b"CGT").multiplicity, 2);
        assert_eq!(edge_for(&graph, b"GTA").multiplicity, 1);
        assert_eq!(edge_for(&graph, b"TAC").multiplicity, 1);

        let tac = edge_for(&graph, b"TAC");
        assert_eq!(graph.node(tac.from), b"TA");
        assert_eq!(graph.node(tac.to), b"AC");
        for node in 0..graph.node_count() {
            assert!(graph.is_linear(node));
        }
    }

    #[test]
    fn test_multiplicity_conserves_occurrences() {
        let (pool, graph) = graph_for(4, &["ACGTTGCA", "CGTTGCAA", "TTTTTT", "GGA"]);
        assert_eq!(graph.total_multiplicity(), pool.total_occurrences());
        assert_eq!(graph.edge_count(), pool.len());
        graph.validate().unwrap();
        for edge in graph.edges() {
            assert_eq!(graph.node(edge.from), prefix(&edge.kmer));
            assert_eq!(graph.node(edge.to), suffix(&edge.kmer));
        }
    }

    #[test]
    fn test_homopolymer_self_loop() {
        let (_, graph) = graph_for(3, &["AAAAA"]);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 1);
        let edge = &graph.edges()[0];
        assert_eq!(edge.from, edge.to);
        assert_eq!(edge.multiplicity, 3);
        assert_eq!(graph.in_degree(edge.from), 1);
        assert_eq!(graph.out_degree(edge.from), 1);
    }

    #[test]
    fn test_add_kmer_accumulates() {
        let mut builder = DeBruijnGraphBuilder::new(3).unwrap();
        builder.add_kmer(b"ACG", 1).unwrap();
        builder.add_kmer(b"ACG", 2).unwrap();
        builder.add_kmer(b"CGA", 1).unwrap();
        let graph = builder.build().unwrap();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(edge_for(&graph, b"ACG").multiplicity, 3);
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_add_kmer_rejects_wrong_width() {
        let mut builder = DeBruijnGraphBuilder::new(3).unwrap();
        assert!(matches!(
            builder.add_kmer(b"ACGT", 1),
            Err(ViromeError::KmerSizeMismatch(3, 4))
        ));
    }

    #[test]
    fn test_missing_node_is_rejected() {
        let nodes = vec![b"AC".to_vec()];
        let edges = vec![Edge {
            from: 0,
            to: 1,
            kmer: b"ACG".to_vec(),
            multiplicity: 1,
        }];
        let err = DeBruijnGraph::from_parts(3, nodes, edges).unwrap_err();
        assert!(matches!(err, ViromeError::GraphInconsistency { .. }));
        assert!(err.to_string().contains("ACG"));
    }

    #[test]
    fn test_mislabelled_node_is_rejected() {
        let nodes = vec![b"AC".to_vec(), b"GG".to_vec()];
        let edges = vec![Edge {
            from: 0,
            to: 1,
            kmer: b"ACG".to_vec(),
            multiplicity: 1,
        }];
        assert!(matches!(
            DeBruijnGraph::from_parts(3, nodes, edges),
            Err(ViromeError::GraphInconsistency { .. })
        ));
    }

    #[test]
    fn test_empty_pool_gives_empty_graph() {
        let (_, graph) = graph_for(5, &["ACG"]);
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }
}
