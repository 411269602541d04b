#[allow(dead_code)]
#[path = "../../src/pdf/testing.rs"]
mod testing;

pub use testing::{build_pdf, page_labels_of};
