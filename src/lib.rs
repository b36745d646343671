//! geneview
//!
//! Loads gene annotation from a DAS (Distributed Annotation System) server,
//! groups the annotated exons into genes and assigns every gene and exon a
//! strand-aware display lane so overlapping features never collide.

pub mod about;
pub mod annotation;
pub mod annotation_loader;
pub mod das_xml;
pub mod error;
pub mod gene_builder;
pub mod track_layout;
pub mod xml_element;

pub use annotation::{Exon, Gene, GeneOrientation, GeneType, ViewScale};
pub use annotation_loader::{AnnotationLoader, AnnotationTrack, LoaderConfig};
pub use das_xml::ParsedAnnotations;
pub use error::{DigestError, FetchError, LoadError, ParseError};
