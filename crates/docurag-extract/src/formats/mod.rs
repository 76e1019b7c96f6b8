pub mod asciidoc;
pub mod html;
pub mod office;

pub use asciidoc::extract_asciidoc;
pub use html::extract_html;
pub use office::{extract_docx, extract_pdf, extract_pptx, extract_xlsx};
