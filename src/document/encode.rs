use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::SortError;
use crate::log;

/// Serializes ordered page images into a single output document.
///
/// Returns the path actually written, which may differ from `output` when an
/// extension had to be added.
pub trait DocumentEncoder {
    fn encode(&self, pages: &[RgbImage], output: &Path) -> Result<PathBuf, SortError>;
}

/// Appends `.pdf` unless the path already ends with it (any case).
pub fn ensure_pdf_extension(path: &Path) -> PathBuf {
    let has_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    if has_pdf {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".pdf");
        PathBuf::from(name)
    }
}

/// Writes one PDF page per image, each embedded as a JPEG.
#[derive(Debug, Clone)]
pub struct PdfEncoder {
    /// Resolution the images were rendered at; maps pixels to points
    pub dpi: u32,
    pub jpeg_quality: u8,
}

impl PdfEncoder {
    pub fn new(dpi: u32, jpeg_quality: u8) -> Self {
        Self {
            dpi: dpi.max(1),
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Page size in PDF points for an image of the given pixel size.
    fn page_size(&self, width: u32, height: u32) -> (i64, i64) {
        let to_points = |px: u32| ((px as f64 * 72.0 / self.dpi as f64).round() as i64).max(1);
        (to_points(width), to_points(height))
    }

    fn build_document(&self, pages: &[RgbImage]) -> Result<Document, SortError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

        for (number, page) in pages.iter().enumerate() {
            let (width, height) = page.dimensions();

            let mut jpeg = Vec::new();
            JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality)
                .encode_image(page)
                .map_err(|e| {
                    SortError::Encoding(format!("page {}: {}", number + 1, e))
                })?;

            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                jpeg,
            ));

            let (page_width, page_height) = self.page_size(width, height);
            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            page_width.into(),
                            0.into(),
                            0.into(),
                            page_height.into(),
                            0.into(),
                            0.into(),
                        ],
                    ),
                    Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                    Operation::new("Q", vec![]),
                ],
            };
            let content_bytes = content
                .encode()
                .map_err(|e| SortError::Encoding(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, content_bytes));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), page_width.into(), page_height.into()],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        "Im0" => image_id,
                    },
                },
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Ok(doc)
    }
}

impl DocumentEncoder for PdfEncoder {
    fn encode(&self, pages: &[RgbImage], output: &Path) -> Result<PathBuf, SortError> {
        if pages.is_empty() {
            return Err(SortError::Encoding("no pages to write".to_string()));
        }

        let path = ensure_pdf_extension(output);
        let mut doc = self.build_document(pages)?;

        let write_error = |source: std::io::Error| SortError::Write {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let file = File::create(&path).map_err(write_error)?;
        let mut writer = BufWriter::new(file);
        doc.save_to(&mut writer)
            .map_err(|e| SortError::Encoding(e.to_string()))?;
        writer.flush().map_err(write_error)?;

        log(&format!("Saved sorted PDF to: {}", path.display()));
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_pdf_extension() {
        assert_eq!(ensure_pdf_extension(Path::new("out")), PathBuf::from("out.pdf"));
        assert_eq!(ensure_pdf_extension(Path::new("out.pdf")), PathBuf::from("out.pdf"));
        assert_eq!(ensure_pdf_extension(Path::new("OUT.PDF")), PathBuf::from("OUT.PDF"));
        assert_eq!(
            ensure_pdf_extension(Path::new("dir/scan.tiff")),
            PathBuf::from("dir/scan.tiff.pdf")
        );
    }

    #[test]
    fn test_page_size_in_points() {
        let encoder = PdfEncoder::new(200, 90);
        // A4 at 200 DPI is 1654 x 2339 px
        assert_eq!(encoder.page_size(1654, 2339), (595, 842));
    }

    #[test]
    fn test_encode_writes_all_pages() {
        let dir = tempdir().unwrap();
        let pages: Vec<RgbImage> = (0..3)
            .map(|i| RgbImage::from_pixel(40, 60, Rgb([i * 80, 255, 255])))
            .collect();
        let encoder = PdfEncoder::new(200, 90);

        let written = encoder.encode(&pages, &dir.path().join("sorted_scan")).unwrap();

        assert_eq!(written, dir.path().join("sorted_scan.pdf"));
        let doc = Document::load(&written).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_encode_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let pages = vec![RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]))];
        let encoder = PdfEncoder::new(200, 90);

        let written = encoder
            .encode(&pages, &dir.path().join("nested").join("out.pdf"))
            .unwrap();

        assert!(written.exists());
    }

    #[test]
    fn test_encode_rejects_empty_input() {
        let dir = tempdir().unwrap();
        let encoder = PdfEncoder::new(200, 90);
        let target = dir.path().join("empty.pdf");

        assert!(matches!(
            encoder.encode(&[], &target),
            Err(SortError::Encoding(_))
        ));
        assert!(!target.exists());
    }
}
