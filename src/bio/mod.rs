pub mod ontology;
pub mod taxonomy;

pub use ontology::OntologyBuilder;
pub use taxonomy::{TaxonomyBuilder, TaxonomyGraph, TaxonomyNode};
