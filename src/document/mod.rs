//! Converting documents to page images and back.

pub mod encode;
pub mod rasterize;

pub use encode::{DocumentEncoder, PdfEncoder, ensure_pdf_extension};
pub use rasterize::{PdftoppmRasterizer, Rasterizer};
