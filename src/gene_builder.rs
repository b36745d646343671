//! Folds parsed exons into one gene per group identifier.

use crate::annotation::{group_key, Exon, Gene};
use log::debug;
use std::collections::HashMap;

/// Builds genes in first-seen group order. Group identifiers are compared
/// case-insensitively; each gene's bounds are the min of its exons' starts
/// and the max of their ends. Chromosome, orientation and type come from the
/// first exon of the group.
pub fn build_genes(exons: &[Exon]) -> Vec<Gene> {
    let mut genes: Vec<Gene> = vec![];
    let mut index_by_group: HashMap<String, usize> = HashMap::new();

    for exon in exons {
        let key = group_key(&exon.group);
        match index_by_group.get(&key) {
            Some(&idx) => genes[idx].absorb(exon),
            None => {
                let idx = genes.len();
                genes.push(Gene::from_first_exon(idx, exon));
                index_by_group.insert(key, idx);
            }
        }
    }

    debug!("Aggregated {} exons into {} genes", exons.len(), genes.len());
    genes
}
