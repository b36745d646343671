//! DAS `features` XML (DASGFF) reader.
//!
//! Only the first `SEGMENT` in the document is read. A document without a
//! segment is an empty answer rather than an error, which is what DAS
//! servers send for regions with no annotation.

use crate::{
    annotation::{Exon, GeneOrientation, GeneType, ViewScale},
    error::ParseError,
    xml_element::{parse_xml_document, XmlElement},
};
use log::warn;
use serde::Serialize;

const SEGMENT_TAG: &str = "SEGMENT";
const FEATURE_TAG: &str = "FEATURE";
const TYPE_TAG: &str = "TYPE";
const START_TAG: &str = "START";
const END_TAG: &str = "END";
const ORIENTATION_TAG: &str = "ORIENTATION";
const GROUP_TAG: &str = "GROUP";
const LINK_TAG: &str = "LINK";

const ID_ATTRIBUTE: &str = "id";
const START_ATTRIBUTE: &str = "start";
const STOP_ATTRIBUTE: &str = "stop";
const HREF_ATTRIBUTE: &str = "href";

/// Result of reading one DAS document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParsedAnnotations {
    /// `None` when the document has no `SEGMENT`.
    pub view_scale: Option<ViewScale>,
    pub exons: Vec<Exon>,
}

impl ParsedAnnotations {
    pub fn is_empty(&self) -> bool {
        self.view_scale.is_none() && self.exons.is_empty()
    }
}

pub fn parse_das_xml_text(xml: &str) -> Result<ParsedAnnotations, ParseError> {
    let document = parse_xml_document(xml)?;
    parse_das_document(&document)
}

pub fn parse_das_xml_file(path: &str) -> Result<ParsedAnnotations, ParseError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ParseError::Xml(format!("Could not read XML file '{path}': {e}")))?;
    parse_das_xml_text(&text)
}

pub fn parse_das_document(root: &XmlElement) -> Result<ParsedAnnotations, ParseError> {
    match root.find_descendant(SEGMENT_TAG) {
        Some(segment) => parse_segment(segment),
        None => Ok(ParsedAnnotations::default()),
    }
}

fn parse_segment(segment: &XmlElement) -> Result<ParsedAnnotations, ParseError> {
    let chr = segment.attribute(ID_ATTRIBUTE).unwrap_or_default().to_string();
    let start = required_int_attribute(segment, START_ATTRIBUTE)?;
    let stop = required_int_attribute(segment, STOP_ATTRIBUTE)?;
    let view_scale = ViewScale::new(chr.as_str(), start, stop);

    let mut exons = vec![];
    for child in segment.children().iter().filter(|c| c.is_named(FEATURE_TAG)) {
        if let Some(exon) = parse_feature(child, &chr) {
            exons.push(exon);
        }
    }

    Ok(ParsedAnnotations {
        view_scale: Some(view_scale),
        exons,
    })
}

/// Returns `None` for a feature without child elements.
fn parse_feature(feature: &XmlElement, chr: &str) -> Option<Exon> {
    if !feature.has_children() {
        return None;
    }

    let mut exon = Exon {
        id: feature.attribute(ID_ATTRIBUTE).unwrap_or_default().to_string(),
        chr: chr.to_string(),
        start: 0,
        end: 0,
        orientation: GeneOrientation::Unknown,
        reference: String::new(),
        group: String::new(),
        gene_type: GeneType::Other,
        order: 0,
    };

    for child in feature.children() {
        if child.is_named(TYPE_TAG) {
            exon.gene_type =
                GeneType::from_type_id(child.attribute(ID_ATTRIBUTE).unwrap_or_default());
        } else if child.is_named(START_TAG) {
            exon.start = optional_int_content(child, &exon.id);
        } else if child.is_named(END_TAG) {
            exon.end = optional_int_content(child, &exon.id);
        } else if child.is_named(ORIENTATION_TAG) {
            exon.orientation =
                GeneOrientation::from_strand_symbol(child.content().unwrap_or_default());
        } else if child.is_named(GROUP_TAG) {
            exon.group = child.attribute(ID_ATTRIBUTE).unwrap_or_default().to_string();
        } else if child.is_named(LINK_TAG) {
            exon.reference = child
                .attribute(HREF_ATTRIBUTE)
                .unwrap_or_default()
                .to_string();
        }
    }

    Some(exon)
}

fn required_int_attribute(element: &XmlElement, attribute: &str) -> Result<i64, ParseError> {
    let raw = element
        .attribute(attribute)
        .ok_or_else(|| ParseError::MissingAttribute {
            element: element.name().to_string(),
            attribute: attribute.to_string(),
        })?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidInteger {
            element: element.name().to_string(),
            field: attribute.to_string(),
            value: raw.to_string(),
        })
}

/// Absent, empty or non-numeric text reads as 0.
fn optional_int_content(element: &XmlElement, feature_id: &str) -> i64 {
    let Some(text) = element.content() else {
        return 0;
    };
    text.parse::<i64>().unwrap_or_else(|_| {
        warn!(
            "FEATURE '{feature_id}' has non-integer <{}> '{text}', using 0",
            element.name()
        );
        0
    })
}
