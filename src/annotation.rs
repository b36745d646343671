//! Typed genomic records produced by the DAS parser and consumed by layout.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneOrientation {
    Plus,
    Minus,
    #[default]
    Unknown,
}

impl GeneOrientation {
    /// Maps a DAS strand symbol; anything other than `+` or `-` is unknown.
    pub fn from_strand_symbol(symbol: &str) -> Self {
        match symbol.trim() {
            "+" => Self::Plus,
            "-" => Self::Minus,
            _ => Self::Unknown,
        }
    }

    /// Lane increment for one overlap step: +1 above the axis, -1 below, 0 on it.
    pub fn lane_step(self) -> i32 {
        match self {
            Self::Plus => 1,
            Self::Minus => -1,
            Self::Unknown => 0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Unknown => ".",
        }
    }
}

impl fmt::Display for GeneOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Distance between two coordinates, saturating at `i64::MAX`.
pub fn coordinate_span(a: i64, b: i64) -> i64 {
    i64::try_from(a.abs_diff(b)).unwrap_or(i64::MAX)
}

/// Case-folded form of a group identifier used for matching and indexing.
pub fn group_key(group: &str) -> String {
    group.to_lowercase()
}

pub const KNOWN_GENE_TYPE_NAME: &str = "knownGene";
pub const REF_SEQ_GENE_TYPE_NAME: &str = "refGene";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneType {
    Known,
    ReferenceSequence,
    #[default]
    Other,
}

impl GeneType {
    pub fn from_type_id(type_id: &str) -> Self {
        let type_id = type_id.trim();
        if type_id.eq_ignore_ascii_case(KNOWN_GENE_TYPE_NAME) {
            Self::Known
        } else if type_id.eq_ignore_ascii_case(REF_SEQ_GENE_TYPE_NAME) {
            Self::ReferenceSequence
        } else {
            Self::Other
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Known => KNOWN_GENE_TYPE_NAME,
            Self::ReferenceSequence => REF_SEQ_GENE_TYPE_NAME,
            Self::Other => "other",
        }
    }
}

/// The genomic window covered by one annotation query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewScale {
    chr: String,
    start: i64,
    stop: i64,
    length: i64,
}

impl ViewScale {
    pub fn new(chr: impl Into<String>, start: i64, stop: i64) -> Self {
        Self {
            chr: chr.into(),
            start,
            stop,
            length: coordinate_span(start, stop),
        }
    }

    pub fn chr(&self) -> &str {
        &self.chr
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn stop(&self) -> i64 {
        self.stop
    }

    pub fn length(&self) -> i64 {
        self.length
    }

    pub fn set_chr(&mut self, chr: impl Into<String>) {
        self.chr = chr.into();
    }

    pub fn set_start(&mut self, start: i64) {
        self.start = start;
        self.length = coordinate_span(self.start, self.stop);
    }

    pub fn set_stop(&mut self, stop: i64) {
        self.stop = stop;
        self.length = coordinate_span(self.start, self.stop);
    }
}

/// One DAS `FEATURE`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exon {
    pub id: String,
    pub chr: String,
    pub start: i64,
    pub end: i64,
    pub orientation: GeneOrientation,
    /// `LINK/@href`, empty when the feature has no link.
    pub reference: String,
    pub group: String,
    pub gene_type: GeneType,
    pub order: i32,
}

impl Exon {
    pub fn length(&self) -> i64 {
        coordinate_span(self.start, self.end)
    }

    pub fn belongs_to(&self, group: &str) -> bool {
        group_key(&self.group) == group_key(group)
    }
}

/// Union of all exons sharing one group identifier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Gene {
    pub id: usize,
    pub chr: String,
    pub start: i64,
    pub end: i64,
    pub orientation: GeneOrientation,
    pub group: String,
    pub gene_type: GeneType,
    pub order: i32,
}

impl Gene {
    /// Seeds a gene from the first exon seen for its group.
    pub fn from_first_exon(id: usize, exon: &Exon) -> Self {
        Self {
            id,
            chr: exon.chr.clone(),
            start: exon.start,
            end: exon.end,
            orientation: exon.orientation,
            group: exon.group.clone(),
            gene_type: exon.gene_type,
            order: 0,
        }
    }

    /// Widens the bounds to cover `exon`; never narrows.
    pub fn absorb(&mut self, exon: &Exon) {
        self.start = self.start.min(exon.start);
        self.end = self.end.max(exon.end);
    }

    pub fn length(&self) -> i64 {
        coordinate_span(self.start, self.end)
    }

    pub fn left(&self) -> i64 {
        self.start.min(self.end)
    }

    pub fn right(&self) -> i64 {
        self.start.max(self.end)
    }
}

impl PartialEq for Gene {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && group_key(&self.group) == group_key(&other.group)
    }
}

impl Eq for Gene {}

impl std::hash::Hash for Gene {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        group_key(&self.group).hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn exon(group: &str, start: i64, end: i64) -> Exon {
        Exon {
            id: format!("{group}.{start}"),
            chr: "chr1".to_string(),
            start,
            end,
            orientation: GeneOrientation::Plus,
            reference: String::new(),
            group: group.to_string(),
            gene_type: GeneType::ReferenceSequence,
            order: 0,
        }
    }

    #[test]
    fn test_strand_symbols() {
        assert_eq!(GeneOrientation::from_strand_symbol("+"), GeneOrientation::Plus);
        assert_eq!(GeneOrientation::from_strand_symbol("-"), GeneOrientation::Minus);
        assert_eq!(GeneOrientation::from_strand_symbol("0"), GeneOrientation::Unknown);
        assert_eq!(GeneOrientation::from_strand_symbol(""), GeneOrientation::Unknown);
    }

    #[test]
    fn test_gene_type_is_case_insensitive() {
        assert_eq!(GeneType::from_type_id("KNOWNGENE"), GeneType::Known);
        assert_eq!(GeneType::from_type_id("refgene"), GeneType::ReferenceSequence);
        assert_eq!(GeneType::from_type_id("ensGene"), GeneType::Other);
    }

    #[test]
    fn test_view_scale_length_follows_mutators() {
        let mut scale = ViewScale::new("chr1", 2000, 1000);
        assert_eq!(scale.length(), 1000);
        scale.set_stop(2500);
        assert_eq!(scale.length(), 500);
        scale.set_start(0);
        assert_eq!(scale.length(), 2500);
        scale.set_chr("chr2");
        assert_eq!(scale.chr(), "chr2");
    }

    #[test]
    fn test_gene_left_right_normalize_reversed_bounds() {
        let mut gene = Gene::from_first_exon(0, &exon("G", 500, 100));
        assert_eq!((gene.left(), gene.right()), (100, 500));
        // Bounds widen by start and end separately, not by normalized edges.
        gene.absorb(&exon("G", 50, 80));
        assert_eq!((gene.start, gene.end), (50, 100));
        assert_eq!(gene.length(), 50);
    }

    #[test]
    fn test_lengths_saturate_at_extreme_coordinates() {
        let scale = ViewScale::new("chr1", i64::MIN, i64::MAX);
        assert_eq!(scale.length(), i64::MAX);
        let mut scale = ViewScale::new("chr1", 0, 10);
        scale.set_start(i64::MIN);
        assert_eq!(scale.length(), i64::MAX);

        let wide = exon("G", i64::MAX, i64::MIN);
        assert_eq!(wide.length(), i64::MAX);
        let gene = Gene::from_first_exon(0, &wide);
        assert_eq!(gene.length(), i64::MAX);
        assert_eq!(coordinate_span(-5, 5), 10);
    }

    #[test]
    fn test_group_matching_folds_non_ascii_case() {
        let member = exon("GÈNE_Ä", 1, 2);
        assert!(member.belongs_to("gène_ä"));
        let a = Gene::from_first_exon(0, &member);
        let b = Gene::from_first_exon(0, &exon("gène_ä", 5, 6));
        assert_eq!(a, b);
    }

    #[test]
    fn test_genes_with_same_id_and_group_are_equal() {
        let a = Gene::from_first_exon(3, &exon("NM_0001", 10, 20));
        let mut b = Gene::from_first_exon(3, &exon("nm_0001", 999, 1999));
        b.order = 7;
        assert_eq!(a, b);

        let c = Gene::from_first_exon(4, &exon("NM_0001", 10, 20));
        assert_ne!(a, c);

        let set: HashSet<Gene> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}
