// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: turn composed page images into a multi-page PDF using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use image::RgbImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use quizcut_core::error::{QuizcutError, Result};
use quizcut_core::types::PaperSize;
use tracing::{debug, info, instrument, warn};

/// Writes full-bleed raster pages into a PDF.
///
/// Each image becomes one page of the configured paper size. Images are
/// placed at the given density, so an image rendered at the same density as
/// the paper fills the page exactly.
pub struct PdfWriter {
    paper_size: PaperSize,
    dpi: u32,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl PdfWriter {
    pub fn new(paper_size: PaperSize, dpi: u32) -> Self {
        Self {
            paper_size,
            dpi,
            title: "Practice Book".to_string(),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Build a PDF with one page per image, in order.
    #[instrument(skip(self, pages), fields(pages = pages.len(), dpi = self.dpi))]
    pub fn create_from_pages(&self, pages: &[RgbImage]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(QuizcutError::PdfError("no pages to write".into()));
        }
        if self.dpi == 0 {
            return Err(QuizcutError::PdfError("density must be positive".into()));
        }

        let (page_w, page_h) = self.page_dimensions();
        let page_h_pt = page_h.into_pt().0;
        info!(paper = ?self.paper_size, title = %self.title, "Creating book PDF");

        let mut doc = PdfDocument::new(&self.title);
        let mut pdf_pages = Vec::with_capacity(pages.len());

        for image in pages {
            let (width, height) = image.dimensions();
            let raw = RawImage {
                pixels: RawImageData::U8(image.as_raw().clone()),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            // PDF origin is bottom-left; anchor the image to the top edge.
            let rendered_h_pt = height as f32 / self.dpi as f32 * 72.0;
            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(page_h_pt - rendered_h_pt)),
                    scale_x: None,
                    scale_y: None,
                    dpi: Some(self.dpi as f32),
                    rotate: None,
                },
            }];
            pdf_pages.push(PdfPage::new(page_w, page_h, ops));
        }

        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings");
        }
        debug!(bytes = output.len(), "PDF serialised");
        Ok(output)
    }

    /// Build the PDF and write it to `path`, creating parent directories.
    pub fn write_pages_to_file(&self, pages: &[RgbImage], path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.create_from_pages(pages)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &bytes)?;
        info!("Wrote book PDF to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn page(shade: u8) -> RgbImage {
        RgbImage::from_pixel(62, 88, Rgb([shade, shade, shade]))
    }

    #[test]
    fn writes_a_pdf_header() {
        let writer = PdfWriter::new(PaperSize::A4, 8);
        let bytes = writer.create_from_pages(&[page(255), page(0)]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_book_is_rejected() {
        let writer = PdfWriter::new(PaperSize::A4, 300);
        assert!(matches!(
            writer.create_from_pages(&[]),
            Err(QuizcutError::PdfError(_))
        ));
    }

    #[test]
    fn file_output_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books").join("practice.pdf");
        let mut writer = PdfWriter::new(PaperSize::A5, 8);
        writer.set_title("Unit 3");
        writer.write_pages_to_file(&[page(200)], &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
