//! Strand-aware lane ("order") assignment for genes and their exons.
//!
//! Plus-strand genes fan out upward from lane 1, minus-strand genes downward
//! from lane -1, and genes of unknown strand stay on lane 0. A gene's lane
//! magnitude is one more than the number of already placed genes on the same
//! strand whose interval intersects its own. Exons take their gene's lane.

use crate::annotation::{group_key, Exon, Gene};
use log::debug;
use std::collections::HashMap;

/// Closed-interval intersection of the normalized gene bounds.
pub fn overlaps(a: &Gene, b: &Gene) -> bool {
    a.left() <= b.right() && b.left() <= a.right()
}

/// Lane of every gene, index-aligned with `genes`, processed in slice order.
pub fn compute_orders(genes: &[Gene]) -> Vec<i32> {
    let mut placed: Vec<&Gene> = Vec::with_capacity(genes.len());
    genes.iter().map(|gene| place_gene(gene, &mut placed)).collect()
}

fn place_gene<'a>(gene: &'a Gene, placed: &mut Vec<&'a Gene>) -> i32 {
    let step = gene.orientation.lane_step();
    let overlapping = placed
        .iter()
        .filter(|other| other.orientation == gene.orientation && overlaps(gene, other))
        .count();
    let lanes = i32::try_from(overlapping).unwrap_or(i32::MAX).saturating_add(1);
    placed.push(gene);
    step.saturating_mul(lanes)
}

/// Writes lanes into `genes` and into every exon whose group matches.
pub fn assign_orders(genes: &mut [Gene], exons: &mut [Exon]) {
    let orders = compute_orders(genes);

    let mut order_by_group: HashMap<String, i32> = HashMap::with_capacity(genes.len());
    for (gene, order) in genes.iter_mut().zip(orders) {
        gene.order = order;
        order_by_group.insert(group_key(&gene.group), order);
    }
    for exon in exons.iter_mut() {
        if let Some(order) = order_by_group.get(&group_key(&exon.group)) {
            exon.order = *order;
        }
    }

    let (lowest, highest) = lane_span(genes);
    debug!(
        "Laid out {} genes and {} exons on lanes {lowest}..={highest}",
        genes.len(),
        exons.len()
    );
}

/// Lowest and highest assigned lane, `(0, 0)` for no genes.
pub fn lane_span(genes: &[Gene]) -> (i32, i32) {
    genes.iter().fold((0, 0), |(lowest, highest), gene| {
        (lowest.min(gene.order), highest.max(gene.order))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{GeneOrientation, GeneType};

    fn gene(id: usize, start: i64, end: i64, orientation: GeneOrientation) -> Gene {
        Gene {
            id,
            chr: "chr1".to_string(),
            start,
            end,
            orientation,
            group: format!("G{id}"),
            gene_type: GeneType::Known,
            order: 0,
        }
    }

    fn exon(group: &str) -> Exon {
        Exon {
            id: format!("{group}.e"),
            chr: "chr1".to_string(),
            start: 0,
            end: 0,
            orientation: GeneOrientation::Plus,
            reference: String::new(),
            group: group.to_string(),
            gene_type: GeneType::Known,
            order: 0,
        }
    }

    fn three_clause_overlap(g: &Gene, tg: &Gene) -> bool {
        (g.left() >= tg.left() && g.left() <= tg.right())
            || (g.right() >= tg.left() && g.right() <= tg.right())
            || (g.left() < tg.left() && g.right() > tg.right())
    }

    #[test]
    fn test_overlapping_plus_genes_stack() {
        use GeneOrientation::Plus;
        let mut genes = vec![gene(0, 1000, 1800, Plus), gene(1, 1700, 1900, Plus)];
        let mut exons = vec![exon("G0"), exon("g0"), exon("G1")];
        assign_orders(&mut genes, &mut exons);
        assert_eq!(genes[0].order, 1);
        assert_eq!(genes[1].order, 2);
        assert_eq!(
            exons.iter().map(|e| e.order).collect::<Vec<_>>(),
            vec![1, 1, 2]
        );
    }

    #[test]
    fn test_initial_lane_follows_strand() {
        use GeneOrientation::*;
        let genes = vec![
            gene(0, 0, 10, Plus),
            gene(1, 0, 10, Minus),
            gene(2, 0, 10, Unknown),
        ];
        assert_eq!(compute_orders(&genes), vec![1, -1, 0]);
    }

    #[test]
    fn test_unknown_strand_never_leaves_lane_zero() {
        use GeneOrientation::Unknown;
        let genes: Vec<Gene> = (0..5).map(|i| gene(i, 0, 100, Unknown)).collect();
        assert_eq!(compute_orders(&genes), vec![0; 5]);
    }

    #[test]
    fn test_disjoint_genes_share_first_lane() {
        use GeneOrientation::Minus;
        let genes = vec![
            gene(0, 0, 10, Minus),
            gene(1, 11, 20, Minus),
            gene(2, 30, 40, Minus),
        ];
        assert_eq!(compute_orders(&genes), vec![-1, -1, -1]);
    }

    #[test]
    fn test_touching_endpoints_overlap() {
        use GeneOrientation::Plus;
        let a = gene(0, 0, 10, Plus);
        let b = gene(1, 10, 20, Plus);
        assert!(overlaps(&a, &b));
        assert_eq!(compute_orders(&[a, b]), vec![1, 2]);
    }

    #[test]
    fn test_lane_counts_every_overlapping_placed_gene() {
        use GeneOrientation::Plus;
        // The third gene bridges two disjoint genes that share lane 1.
        let genes = vec![
            gene(0, 0, 10, Plus),
            gene(1, 20, 30, Plus),
            gene(2, 5, 25, Plus),
        ];
        assert_eq!(compute_orders(&genes), vec![1, 1, 3]);
    }

    #[test]
    fn test_reversed_bounds_are_normalized() {
        use GeneOrientation::Minus;
        let genes = vec![gene(0, 500, 100, Minus), gene(1, 450, 600, Minus)];
        assert_eq!(compute_orders(&genes), vec![-1, -2]);
    }

    #[test]
    fn test_overlap_is_symmetric_and_matches_three_clause_form() {
        let bounds: Vec<(i64, i64)> = (0..6)
            .flat_map(|s| (0..6).map(move |e| (s * 2, e * 2 + 1)))
            .chain([(9, 2), (4, 4), (12, 0)])
            .collect();
        for (i, &(s1, e1)) in bounds.iter().enumerate() {
            for (j, &(s2, e2)) in bounds.iter().enumerate() {
                let a = gene(i, s1, e1, GeneOrientation::Plus);
                let b = gene(j, s2, e2, GeneOrientation::Plus);
                assert_eq!(overlaps(&a, &b), overlaps(&b, &a), "{a:?} vs {b:?}");
                assert_eq!(
                    overlaps(&a, &b),
                    three_clause_overlap(&a, &b),
                    "{a:?} vs {b:?}"
                );
            }
        }
    }

    #[test]
    fn test_lane_monotonic_within_cluster() {
        use GeneOrientation::Plus;
        let genes: Vec<Gene> = (0..6)
            .map(|i| gene(i, i as i64 * 5, 100 + i as i64, Plus))
            .collect();
        let orders = compute_orders(&genes);
        assert_eq!(orders, vec![1, 2, 3, 4, 5, 6]);
        for pair in orders.windows(2) {
            assert!(pair[1].abs() >= pair[0].abs() - 1);
        }
    }

    #[test]
    fn test_strands_do_not_influence_each_other() {
        use GeneOrientation::*;
        let minus_only = vec![
            gene(0, 0, 50, Minus),
            gene(1, 40, 90, Minus),
            gene(2, 80, 120, Minus),
        ];
        let minus_orders = compute_orders(&minus_only);
        assert_eq!(minus_orders, vec![-1, -2, -2]);

        let mixed = vec![
            gene(10, 0, 200, Plus),
            minus_only[0].clone(),
            gene(11, 0, 200, Unknown),
            minus_only[1].clone(),
            gene(12, 30, 100, Plus),
            minus_only[2].clone(),
        ];
        let mixed_orders = compute_orders(&mixed);
        assert_eq!(
            vec![mixed_orders[1], mixed_orders[3], mixed_orders[5]],
            minus_orders
        );
        assert_eq!(
            vec![mixed_orders[0], mixed_orders[2], mixed_orders[4]],
            vec![1, 0, 2]
        );
    }

    #[test]
    fn test_exons_of_unknown_groups_keep_lane_zero() {
        let mut genes = vec![gene(0, 0, 10, GeneOrientation::Plus)];
        let mut exons = vec![exon("other")];
        assign_orders(&mut genes, &mut exons);
        assert_eq!(exons[0].order, 0);
        assert_eq!(lane_span(&genes), (0, 1));
    }
}
