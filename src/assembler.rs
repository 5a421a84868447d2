//! Unitig extraction from the de Bruijn graph.
//!
//! A node is linear when it has exactly one incoming and one outgoing edge
//! (distinct edges, multiplicity ignored). Unitigs start on every outgoing
//! edge of a non-linear node and extend through linear nodes. Components made
//! only of linear nodes are cycles; each is emitted once, starting from its
//! lexicographically smallest node.

use log::debug;

use crate::{errors::ViromeError, graph::DeBruijnGraph, types::Contig};

pub struct ContigAssembler;

impl ContigAssembler {
    /// Maximal non-branching paths as lists of edge ids. Every edge of the
    /// graph appears in exactly one path.
    pub fn unitig_paths(graph: &DeBruijnGraph) -> Result<Vec<Vec<usize>>, ViromeError> {
        graph.validate()?;

        let order = graph.nodes_by_key();
        let mut used = vec![false; graph.edge_count()];
        let mut paths = Vec::new();

        for &node in &order {
            if graph.is_linear(node) {
                continue;
            }
            for &edge in graph.out_edges(node) {
                if !used[edge] {
                    paths.push(extend(graph, edge, &mut used));
                }
            }
        }

        // Whatever is left lives on isolated cycles.
        for &node in &order {
            if !graph.is_linear(node) {
                continue;
            }
            let edge = graph.out_edges(node)[0];
            if !used[edge] {
                paths.push(extend(graph, edge, &mut used));
            }
        }

        Ok(paths)
    }

    /// Assembles contigs with ids assigned from 1 in discovery order.
    pub fn assemble(graph: &DeBruijnGraph) -> Result<Vec<Contig>, ViromeError> {
        let contigs: Vec<Contig> = Self::unitig_paths(graph)?
            .iter()
            .enumerate()
            .map(|(i, path)| Contig {
                id: i + 1,
                sequence: spell_path(graph, path),
            })
            .collect();
        debug!(
            "Assembled {} contigs from {} edges",
            contigs.len(),
            graph.edge_count()
        );
        Ok(contigs)
    }
}

fn extend(graph: &DeBruijnGraph, first: usize, used: &mut [bool]) -> Vec<usize> {
    used[first] = true;
    let mut path = vec![first];
    let mut node = graph.edge(first).to;
    while graph.is_linear(node) {
        let next = graph.out_edges(node)[0];
        if used[next] {
            break;
        }
        used[next] = true;
        path.push(next);
        node = graph.edge(next).to;
    }
    path
}

/// Overlap-joins the k-mers along a path: the first edge contributes its full
/// k-mer, each later edge only its last symbol.
pub fn spell_path(graph: &DeBruijnGraph, path: &[usize]) -> Vec<u8> {
    let Some((&first, rest)) = path.split_first() else {
        return Vec::new();
    };
    let mut sequence = graph.edge(first).kmer.clone();
    sequence.reserve(rest.len());
    for &edge in rest {
        if let Some(&last) = graph.edge(edge).kmer.last() {
            sequence.push(last);
        }
    }
    sequence
}
