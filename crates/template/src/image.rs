//! Image placement at a marked token

use crate::engine::{fill, PlaceholderMap, Traversal};
use crate::{Result, TemplateError};
use docx_core::{detect_format, pixel_dimensions, Document, DocxError, Length, Run};
use log::debug;
use std::path::PathBuf;

/// Image payload for [`place_image`]
#[derive(Debug, Clone)]
pub enum ImageSource {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

impl ImageSource {
    /// Read the image bytes
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            ImageSource::Bytes(bytes) => Ok(bytes),
            ImageSource::Path(path) => Ok(std::fs::read(path)?),
        }
    }
}

/// Replace `token` with an inline image
///
/// Without a payload this is exactly `fill` with the token mapped to an
/// empty string. With one, the first visited paragraph containing the token
/// loses the token and gets a new run holding the image, sized to its
/// 96-dpi size and scaled down to `max_width`. Returns whether a paragraph
/// was changed.
pub fn place_image(
    doc: &mut Document,
    token: &str,
    source: Option<ImageSource>,
    max_width: Length,
    traversal: Traversal,
) -> Result<bool> {
    let Some(source) = source else {
        let mut map = PlaceholderMap::new();
        map.insert(token, "");
        return Ok(fill(doc, &map, traversal) > 0);
    };

    if token.is_empty() || !contains_token(doc, token, traversal) {
        debug!("image token {token} not found");
        return Ok(false);
    }

    let bytes = source.into_bytes()?;
    detect_format(&bytes).map_err(image_error)?;
    pixel_dimensions(&bytes).map_err(image_error)?;

    let name = token
        .trim_start_matches(crate::TOKEN_OPEN)
        .trim_end_matches(crate::TOKEN_CLOSE)
        .trim();
    let image = doc.inline_image(bytes, max_width, name)?;

    for part in doc.parts_mut(traversal.includes_headers_footers()) {
        let part_name = part.name().to_string();
        for paragraph in part.paragraphs_mut() {
            let text = paragraph.text();
            if text.contains(token) {
                paragraph.collapse_text(&text.replace(token, ""));
                paragraph.push_run(Run::image(image));
                debug!("placed image at {token} in {part_name}");
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn contains_token(doc: &Document, token: &str, traversal: Traversal) -> bool {
    doc.parts()
        .into_iter()
        .filter(|part| traversal.visits(part.kind()))
        .any(|part| part.paragraphs().iter().any(|p| p.text().contains(token)))
}

fn image_error(err: DocxError) -> TemplateError {
    match err {
        DocxError::UnsupportedImage(message) => TemplateError::UnsupportedImage(message),
        other => TemplateError::Docx(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_core::{Paragraph, RunContent};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::new(width, height);
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn doc_with(texts: &[&str]) -> Document {
        let mut doc = Document::new();
        for text in texts {
            doc.push_paragraph(Paragraph::with_text(text));
        }
        doc
    }

    #[test]
    fn test_place_image_in_first_match() {
        let mut doc = doc_with(&["Foto: {{ IMAGEM }}", "{{ IMAGEM }} de novo"]);
        let placed = place_image(
            &mut doc,
            "{{ IMAGEM }}",
            Some(ImageSource::Bytes(png_bytes(1000, 500))),
            Length::from_px(500),
            Traversal::Body,
        )
        .unwrap();
        assert!(placed);

        let paragraphs = doc.body.paragraphs();
        assert_eq!(paragraphs[0].text(), "Foto: ");
        assert_eq!(paragraphs[1].text(), "{{ IMAGEM }} de novo");

        let image = paragraphs[0]
            .runs()
            .flat_map(|run| run.images())
            .next()
            .unwrap();
        assert_eq!(image.width, Length::from_px(500));
        assert_eq!(image.height, Length::from_px(250));
        assert_eq!(image.name, "IMAGEM");
    }

    #[test]
    fn test_missing_token_has_no_effect() {
        let mut doc = doc_with(&["sem imagem"]);
        let before = doc.body.blocks.clone();
        let placed = place_image(
            &mut doc,
            "{{ IMAGEM }}",
            Some(ImageSource::Bytes(png_bytes(10, 10))),
            Length::from_mm(150.0),
            Traversal::Body,
        )
        .unwrap();
        assert!(!placed);
        assert_eq!(doc.body.blocks, before);
    }

    #[test]
    fn test_missing_token_ignores_bad_payload() {
        let mut doc = doc_with(&["sem imagem"]);
        let placed = place_image(
            &mut doc,
            "{{ IMAGEM }}",
            Some(ImageSource::Bytes(b"not an image".to_vec())),
            Length::from_mm(150.0),
            Traversal::Body,
        )
        .unwrap();
        assert!(!placed);
        assert_eq!(doc.body.paragraphs()[0].text(), "sem imagem");
    }

    #[test]
    fn test_unsupported_image() {
        let mut doc = doc_with(&["{{ IMAGEM }}"]);
        let err = place_image(
            &mut doc,
            "{{ IMAGEM }}",
            Some(ImageSource::Bytes(b"GIF89a......".to_vec())),
            Length::from_mm(150.0),
            Traversal::Body,
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::UnsupportedImage(_)));
        assert_eq!(doc.body.paragraphs()[0].text(), "{{ IMAGEM }}");
    }

    #[test]
    fn test_image_run_follows_text() {
        let mut doc = doc_with(&["{{ IMAGEM }}"]);
        place_image(
            &mut doc,
            "{{ IMAGEM }}",
            Some(ImageSource::Bytes(png_bytes(4, 4))),
            Length::from_mm(150.0),
            Traversal::Body,
        )
        .unwrap();
        let paragraph = doc.body.paragraphs()[0];
        let runs: Vec<&Run> = paragraph.runs().collect();
        assert_eq!(runs.len(), 2);
        assert!(matches!(runs[1].content[0], RunContent::Image(_)));
    }
}
