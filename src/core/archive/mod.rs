pub mod extract;

pub use extract::{extract_zip, extract_zip_file};
