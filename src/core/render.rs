//! PDF application-form rendering.
//!
//! Produces a paginated A4 document from an application record: title,
//! metadata lines, grouped sections, and at most one embedded photo. The
//! layout is purely textual - a vertical cursor walks down the page, and a
//! new page starts whenever a section would begin past the near-bottom
//! threshold. The photo is embedded at print density and scaled down to fit
//! the content width and a fixed maximum height, preserving aspect ratio.

use image::{DynamicImage, GenericImageView};
use printpdf::{
    BuiltinFont, Image as PdfImage, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference,
};
use tracing::debug;

use crate::core::rehome::FALLBACK_EXTENSIONS;
use crate::entities::PartApplication;
use crate::errors::{Error, Result};
use crate::store::BlobStore;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_LEFT: f32 = 20.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_LEFT;
/// Vertical cursor position (mm from the top) past which the next section
/// starts on a fresh page.
const PAGE_BREAK_AT: f32 = 260.0;
const LINE_HEIGHT: f32 = 6.0;
const SECTION_GAP: f32 = 4.0;
const IMAGE_MAX_HEIGHT: f32 = 90.0;
/// Embed density. 300dpi is roughly 4x screen density, enough for print.
const IMAGE_DPI: f32 = 300.0;
/// Body text wraps at this many characters per line.
const WRAP_WIDTH: usize = 90;

/// Download filename for an application's rendered form.
#[must_use]
pub fn pdf_filename(id: &str) -> String {
    format!("{id}_application.pdf")
}

/// Greedy word wrap. Words longer than `max_chars` get a line of their own;
/// embedded newlines are respected.
#[must_use]
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line = word.to_string();
            } else if line.len() + 1 + word.len() <= max_chars {
                line.push(' ');
                line.push_str(word);
            } else {
                lines.push(std::mem::take(&mut line));
                line = word.to_string();
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}

/// Resolves the application's photo: the stored image URL first, then the
/// public fallback chain (`.png`, `.jpg`, `.webp`), stopping at the first
/// response that decodes. `None` when nothing resolves.
pub async fn resolve_image(
    blobs: &dyn BlobStore,
    application: &PartApplication,
) -> Option<DynamicImage> {
    let mut candidates: Vec<String> = Vec::new();
    if let Some(url) = &application.image_url {
        candidates.push(url.clone());
    }
    for ext in FALLBACK_EXTENSIONS {
        if let Ok(url) = blobs
            .download_url(&format!("{}.{ext}", application.id))
            .await
        {
            candidates.push(url);
        }
    }

    for url in candidates {
        match blobs.fetch(&url).await {
            Ok(bytes) => match image::load_from_memory(&bytes) {
                Ok(decoded) => return Some(decoded),
                Err(e) => debug!("image at {url} does not decode: {e}"),
            },
            Err(e) => debug!("image fetch from {url} failed: {e}"),
        }
    }
    None
}

struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Vertical cursor, mm from the top edge.
    y: f32,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| Error::Render {
                message: e.to_string(),
            })?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| Error::Render {
                message: e.to_string(),
            })?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: MARGIN_TOP,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = MARGIN_TOP;
    }

    /// Section-level page break: a section never starts below the threshold.
    fn start_section(&mut self, heading: &str) {
        if self.y > PAGE_BREAK_AT {
            self.new_page();
        }
        self.y += SECTION_GAP;
        let font = self.bold.clone();
        self.line(heading, &font, 12.0);
    }

    fn line(&mut self, text: &str, font: &IndirectFontRef, size: f32) {
        self.layer
            .use_text(text, size, Mm(MARGIN_LEFT), Mm(PAGE_HEIGHT - self.y), font);
        self.y += LINE_HEIGHT;
    }

    fn body_line(&mut self, text: &str) {
        let font = self.regular.clone();
        self.line(text, &font, 10.0);
    }

    fn wrapped_body(&mut self, text: &str) {
        for line in wrap_text(text, WRAP_WIDTH) {
            self.body_line(&line);
        }
    }

    fn embed_image(&mut self, decoded: &DynamicImage) {
        if self.y > PAGE_BREAK_AT - IMAGE_MAX_HEIGHT {
            self.new_page();
        }

        // The PDF layer does not handle alpha channels; flatten to RGB.
        let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
        let (px_w, px_h) = rgb.dimensions();
        let natural_w = px_w as f32 * 25.4 / IMAGE_DPI;
        let natural_h = px_h as f32 * 25.4 / IMAGE_DPI;

        // Shrink to fit width and max height, never enlarge.
        let scale = (CONTENT_WIDTH / natural_w)
            .min(IMAGE_MAX_HEIGHT / natural_h)
            .min(1.0);
        let shown_h = natural_h * scale;

        let pdf_image = PdfImage::from_dynamic_image(&rgb);
        pdf_image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN_LEFT)),
                translate_y: Some(Mm(PAGE_HEIGHT - self.y - shown_h)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        self.y += shown_h + SECTION_GAP;
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc.save_to_bytes().map_err(|e| Error::Render {
            message: e.to_string(),
        })
    }
}

/// Renders the application form. `image` is the photo to embed, if one
/// resolved; the textual document is produced either way.
///
/// # Errors
/// `Error::Render` when PDF assembly fails.
pub fn render_application(
    application: &PartApplication,
    image: Option<&DynamicImage>,
) -> Result<Vec<u8>> {
    let mut page = PageWriter::new("Part Application")?;

    let bold = page.bold.clone();
    page.line("New Part Application", &bold, 18.0);
    page.y += SECTION_GAP;

    page.body_line(&format!("Application: {}", application.id));
    page.body_line(&format!(
        "Date: {}",
        application.submitted_at.format("%Y-%m-%d")
    ));
    page.body_line(&format!("Status: {}", application.status));
    page.body_line(&format!("Priority: {}", application.priority));

    page.start_section("Part Information");
    page.body_line(&format!("Supplier: {}", application.supplier));
    page.body_line(&format!(
        "Standard price: {:.2}",
        application.standard_price
    ));
    if let Some(code) = &application.part_code {
        page.body_line(&format!("Assigned part code: {code}"));
    }

    page.start_section("Request Information");
    page.body_line(&format!("Requester: {}", application.requester));
    page.body_line(&format!("Department: {}", application.department));

    if !application.specifications.trim().is_empty() {
        page.start_section("Technical Specifications");
        page.wrapped_body(&application.specifications);
    }

    if let Some(justification) = &application.justification {
        if !justification.trim().is_empty() {
            page.start_section("Justification");
            page.wrapped_body(justification);
        }
    }

    if let Some(notes) = &application.notes {
        if !notes.trim().is_empty() {
            page.start_section("Notes");
            page.wrapped_body(notes);
        }
    }

    if let Some(decoded) = image {
        page.start_section("Attached Photo");
        page.embed_image(decoded);
    }

    page.finish()
}
