//! Image handling for inline pictures

use crate::xml::XmlElement;
use crate::{DocxError, Result};
use image::ImageReader;
use std::io::Cursor;

/// EMUs (English Metric Units) per millimetre
const EMU_PER_MM: f64 = 36_000.0;
/// EMUs per pixel at 96 dpi
const EMU_PER_PX: i64 = 9_525;

/// A length in EMUs, the unit DrawingML uses for sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Length(i64);

impl Length {
    pub fn from_emu(emu: i64) -> Self {
        Self(emu)
    }

    pub fn from_mm(mm: f64) -> Self {
        Self((mm * EMU_PER_MM).round() as i64)
    }

    /// Pixels at 96 dpi
    pub fn from_px(px: u32) -> Self {
        Self(px as i64 * EMU_PER_PX)
    }

    pub fn emu(&self) -> i64 {
        self.0
    }

    pub fn mm(&self) -> f64 {
        self.0 as f64 / EMU_PER_MM
    }
}

/// Supported picture formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// File extension used for the media part
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    /// MIME type for `[Content_Types].xml`
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Detect the image format from its bytes
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    match image::guess_format(data) {
        Ok(image::ImageFormat::Png) => Ok(ImageFormat::Png),
        Ok(image::ImageFormat::Jpeg) => Ok(ImageFormat::Jpeg),
        Ok(other) => Err(DocxError::UnsupportedImage(format!("{other:?}"))),
        Err(_) => Err(DocxError::UnsupportedImage(
            "unrecognized image data".to_string(),
        )),
    }
}

/// Pixel dimensions (width, height) without decoding the whole image
pub fn pixel_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(DocxError::Io)?;
    reader
        .into_dimensions()
        .map_err(|e| DocxError::UnsupportedImage(e.to_string()))
}

/// Display size for an image: its size at 96 dpi, scaled down
/// proportionally so the width does not exceed `max_width`
pub fn fit_width(width_px: u32, height_px: u32, max_width: Length) -> (Length, Length) {
    let width = Length::from_px(width_px);
    let height = Length::from_px(height_px);
    if width <= max_width || width_px == 0 {
        return (width, height);
    }
    let scaled = (height.emu() as f64 * max_width.emu() as f64 / width.emu() as f64).round();
    (max_width, Length::from_emu(scaled as i64))
}

/// Index of an image registered with a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaId(pub(crate) usize);

/// Image bytes registered with a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

/// An inline picture placed in a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub media: MediaId,
    pub width: Length,
    pub height: Length,
    /// Picture name shown by word processors
    pub name: String,
}

/// DrawingML for an inline picture (`w:drawing`)
pub(crate) fn drawing_element(
    image: &InlineImage,
    relationship_id: &str,
    drawing_id: u32,
) -> XmlElement {
    let cx = image.width.emu().to_string();
    let cy = image.height.emu().to_string();
    let id = drawing_id.to_string();

    let extent = XmlElement::new("wp:extent")
        .with_attr("cx", cx.as_str())
        .with_attr("cy", cy.as_str());
    let doc_pr = XmlElement::new("wp:docPr")
        .with_attr("id", id.as_str())
        .with_attr("name", image.name.as_str());
    let frame_pr = XmlElement::new("wp:cNvGraphicFramePr").with_child(
        XmlElement::new("a:graphicFrameLocks").with_attr("noChangeAspect", "1"),
    );

    let picture = XmlElement::new("pic:pic")
        .with_attr(
            "xmlns:pic",
            "http://schemas.openxmlformats.org/drawingml/2006/picture",
        )
        .with_child(
            XmlElement::new("pic:nvPicPr")
                .with_child(
                    XmlElement::new("pic:cNvPr")
                        .with_attr("id", "0")
                        .with_attr("name", image.name.as_str()),
                )
                .with_child(XmlElement::new("pic:cNvPicPr")),
        )
        .with_child(
            XmlElement::new("pic:blipFill")
                .with_child(XmlElement::new("a:blip").with_attr("r:embed", relationship_id))
                .with_child(XmlElement::new("a:stretch").with_child(XmlElement::new("a:fillRect"))),
        )
        .with_child(
            XmlElement::new("pic:spPr")
                .with_child(
                    XmlElement::new("a:xfrm")
                        .with_child(XmlElement::new("a:off").with_attr("x", "0").with_attr("y", "0"))
                        .with_child(
                            XmlElement::new("a:ext")
                                .with_attr("cx", cx.as_str())
                                .with_attr("cy", cy.as_str()),
                        ),
                )
                .with_child(
                    XmlElement::new("a:prstGeom")
                        .with_attr("prst", "rect")
                        .with_child(XmlElement::new("a:avLst")),
                ),
        );

    let graphic = XmlElement::new("a:graphic")
        .with_attr("xmlns:a", "http://schemas.openxmlformats.org/drawingml/2006/main")
        .with_child(
            XmlElement::new("a:graphicData")
                .with_attr(
                    "uri",
                    "http://schemas.openxmlformats.org/drawingml/2006/picture",
                )
                .with_child(picture),
        );

    let inline = XmlElement::new("wp:inline")
        .with_attr(
            "xmlns:wp",
            "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing",
        )
        .with_attr(
            "xmlns:r",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
        )
        .with_attr("xmlns:a", "http://schemas.openxmlformats.org/drawingml/2006/main")
        .with_attr("distT", "0")
        .with_attr("distB", "0")
        .with_attr("distL", "0")
        .with_attr("distR", "0")
        .with_child(extent)
        .with_child(doc_pr)
        .with_child(frame_pr)
        .with_child(graphic);

    XmlElement::new("w:drawing").with_child(inline)
}
