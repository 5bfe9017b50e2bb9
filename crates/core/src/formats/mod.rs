//! Title extraction for non-HTML documents.

pub mod notebook;
pub mod pdf;

pub use notebook::notebook_title;
pub use pdf::{pdf_title, pdf_title_blocking};
