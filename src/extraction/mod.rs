pub mod extractor;
pub mod script;

pub use extractor::{extract, RawCandidate};
pub use script::ELEMENT_EXTRACTION_SCRIPT;
