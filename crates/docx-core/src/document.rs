//! Document structure and management

use crate::image::{detect_format, fit_width, pixel_dimensions, InlineImage, Length, Media, MediaId};
use crate::model::{paragraphs, paragraphs_mut, Block, Paragraph};
use crate::package::{self, Relationship};
use crate::xml::{XmlElement, XmlNode};
use crate::Result;
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Which story a part holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Body,
    Header,
    Footer,
}

/// One XML part of the package in model form
#[derive(Debug, Clone)]
pub struct Part {
    pub(crate) name: String,
    pub(crate) kind: PartKind,
    /// Root element with the block container emptied
    pub(crate) root: XmlElement,
    pub blocks: Vec<Block>,
}

impl Part {
    /// Zip entry name, e.g. `word/header1.xml`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PartKind {
        self.kind
    }

    /// All paragraphs, including those inside (nested) tables
    pub fn paragraphs(&self) -> Vec<&Paragraph> {
        paragraphs(&self.blocks)
    }

    pub fn paragraphs_mut(&mut self) -> Vec<&mut Paragraph> {
        paragraphs_mut(&mut self.blocks)
    }

    /// Paragraph texts joined by newlines
    pub fn text(&self) -> String {
        self.paragraphs()
            .iter()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A package entry kept as raw bytes
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub name: String,
    pub data: Vec<u8>,
}

/// A Word document
#[derive(Debug, Clone)]
pub struct Document {
    pub body: Part,
    pub headers: Vec<Part>,
    pub footers: Vec<Part>,
    pub(crate) entries: Vec<Entry>,
    pub(crate) media: Vec<Media>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a blank A4 document
    pub fn new() -> Self {
        let root = XmlElement::new("w:document")
            .with_attr("xmlns:w", package::NS_W)
            .with_attr("xmlns:r", package::NS_R)
            .with_attr("xmlns:wp", package::NS_WP)
            .with_child(XmlElement::new("w:body"));

        let section = XmlElement::new("w:sectPr")
            .with_child(
                XmlElement::new("w:pgSz")
                    .with_attr("w:w", "11906")
                    .with_attr("w:h", "16838"),
            )
            .with_child(
                XmlElement::new("w:pgMar")
                    .with_attr("w:top", "1440")
                    .with_attr("w:right", "1440")
                    .with_attr("w:bottom", "1440")
                    .with_attr("w:left", "1440")
                    .with_attr("w:header", "708")
                    .with_attr("w:footer", "708")
                    .with_attr("w:gutter", "0"),
            );

        let content_types = XmlElement::new("Types")
            .with_attr("xmlns", package::NS_CONTENT_TYPES)
            .with_child(
                XmlElement::new("Default")
                    .with_attr("Extension", "rels")
                    .with_attr("ContentType", package::CT_RELS),
            )
            .with_child(
                XmlElement::new("Default")
                    .with_attr("Extension", "xml")
                    .with_attr("ContentType", "application/xml"),
            )
            .with_child(
                XmlElement::new("Override")
                    .with_attr("PartName", format!("/{}", package::DEFAULT_MAIN_PART))
                    .with_attr("ContentType", package::CT_MAIN),
            );

        let root_rels = package::empty_relationships().with_child(
            Relationship {
                id: "rId1".to_string(),
                kind: package::REL_OFFICE_DOCUMENT.to_string(),
                target: package::DEFAULT_MAIN_PART.to_string(),
                external: false,
            }
            .to_element(),
        );

        let entries = vec![
            Entry {
                name: package::CONTENT_TYPES.to_string(),
                data: xml_bytes(&content_types),
            },
            Entry {
                name: package::ROOT_RELS.to_string(),
                data: xml_bytes(&root_rels),
            },
            // Placeholder; the body part is serialized on save.
            Entry {
                name: package::DEFAULT_MAIN_PART.to_string(),
                data: Vec::new(),
            },
            Entry {
                name: package::rels_name(package::DEFAULT_MAIN_PART),
                data: xml_bytes(&package::empty_relationships()),
            },
        ];

        Self {
            body: Part {
                name: package::DEFAULT_MAIN_PART.to_string(),
                kind: PartKind::Body,
                root,
                blocks: vec![Block::Other(section)],
            },
            headers: Vec::new(),
            footers: Vec::new(),
            entries,
            media: Vec::new(),
        }
    }

    /// Open a `.docx` file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        debug!("reading {}", path.as_ref().display());
        Self::from_bytes(&bytes)
    }

    /// Read a `.docx` package from memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        package::read(bytes)
    }

    /// Save to a `.docx` file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path.as_ref(), bytes)?;
        debug!("wrote {}", path.as_ref().display());
        Ok(())
    }

    /// Serialize the package
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        package::write(self)
    }

    /// Append a paragraph to the body, before the final section properties
    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.push_block(Block::Paragraph(paragraph));
    }

    /// Append a block to the body, before the final section properties
    pub fn push_block(&mut self, block: Block) {
        let at = match self.body.blocks.last() {
            Some(Block::Other(el)) if el.name == "w:sectPr" => self.body.blocks.len() - 1,
            _ => self.body.blocks.len(),
        };
        self.body.blocks.insert(at, block);
    }

    /// Add a default header to the final section
    pub fn add_header(&mut self, blocks: Vec<Block>) -> Result<&mut Part> {
        let part = self.add_story(PartKind::Header, blocks)?;
        self.headers.push(part);
        let index = self.headers.len() - 1;
        Ok(&mut self.headers[index])
    }

    /// Add a default footer to the final section
    pub fn add_footer(&mut self, blocks: Vec<Block>) -> Result<&mut Part> {
        let part = self.add_story(PartKind::Footer, blocks)?;
        self.footers.push(part);
        let index = self.footers.len() - 1;
        Ok(&mut self.footers[index])
    }

    fn add_story(&mut self, kind: PartKind, blocks: Vec<Block>) -> Result<Part> {
        let (stem, root_name, rel_kind, content_type, reference) = match kind {
            PartKind::Footer => (
                "footer",
                "w:ftr",
                package::REL_FOOTER,
                package::CT_FOOTER,
                "w:footerReference",
            ),
            _ => (
                "header",
                "w:hdr",
                package::REL_HEADER,
                package::CT_HEADER,
                "w:headerReference",
            ),
        };

        let taken: HashSet<String> = self.entries.iter().map(|e| e.name.clone()).collect();
        let name = (1..)
            .map(|n| format!("word/{stem}{n}.xml"))
            .find(|candidate| !taken.contains(candidate))
            .unwrap_or_else(|| format!("word/{stem}.xml"));

        // Content type override
        let mut types = XmlElement::parse(&package::entry_text(&self.entries, package::CONTENT_TYPES)?)?;
        package::add_override_content_type(&mut types, &name, content_type);
        self.set_entry(package::CONTENT_TYPES, xml_bytes(&types));

        // Relationship from the main part
        let rels_name = package::rels_name(&self.body.name);
        let mut rels = match package::find_entry(&self.entries, &rels_name) {
            Some(_) => XmlElement::parse(&package::entry_text(&self.entries, &rels_name)?)?,
            None => package::empty_relationships(),
        };
        let ids: HashSet<String> = rels
            .elements()
            .filter_map(|el| el.attr("Id"))
            .map(str::to_string)
            .collect();
        let rel_id = (1..)
            .map(|n| format!("rIdStory{n}"))
            .find(|candidate| !ids.contains(candidate))
            .unwrap_or_else(|| format!("rId{stem}"));
        let target = name.strip_prefix("word/").unwrap_or(&name).to_string();
        rels.children.push(XmlNode::Element(
            Relationship {
                id: rel_id.clone(),
                kind: rel_kind.to_string(),
                target,
                external: false,
            }
            .to_element(),
        ));
        self.set_entry(&rels_name, xml_bytes(&rels));

        // Placeholder; the part is serialized on save.
        self.entries.push(Entry {
            name: name.clone(),
            data: Vec::new(),
        });

        let mut section = match self.body.blocks.pop() {
            Some(Block::Other(el)) if el.name == "w:sectPr" => el,
            Some(other) => {
                self.body.blocks.push(other);
                XmlElement::new("w:sectPr")
            }
            None => XmlElement::new("w:sectPr"),
        };
        let reference = XmlElement::new(reference)
            .with_attr("w:type", "default")
            .with_attr("r:id", rel_id.as_str());
        let leading = |names: &[&str]| {
            section
                .children
                .iter()
                .take_while(|node| matches!(node, XmlNode::Element(el) if names.contains(&el.name.as_str())))
                .count()
        };
        // Header references precede footer references.
        let at = match kind {
            PartKind::Footer => leading(&["w:headerReference", "w:footerReference"]),
            _ => leading(&["w:headerReference"]),
        };
        section.children.insert(at, XmlNode::Element(reference));
        self.body.blocks.push(Block::Other(section));

        debug!("added {name} as {rel_id}");

        Ok(Part {
            name,
            kind,
            root: XmlElement::new(root_name)
                .with_attr("xmlns:w", package::NS_W)
                .with_attr("xmlns:r", package::NS_R)
                .with_attr("xmlns:wp", package::NS_WP),
            blocks,
        })
    }

    fn set_entry(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(Entry {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Body, headers and footers, in that order
    pub fn parts(&self) -> Vec<&Part> {
        std::iter::once(&self.body)
            .chain(self.headers.iter())
            .chain(self.footers.iter())
            .collect()
    }

    /// The body, plus headers and footers when `include_headers_footers`
    pub fn parts_mut(&mut self, include_headers_footers: bool) -> Vec<&mut Part> {
        let mut parts = vec![&mut self.body];
        if include_headers_footers {
            parts.extend(self.headers.iter_mut());
            parts.extend(self.footers.iter_mut());
        }
        parts
    }

    /// Register image bytes (PNG or JPEG) with the document
    pub fn add_image(&mut self, data: Vec<u8>) -> Result<MediaId> {
        let format = detect_format(&data)?;
        self.media.push(Media { format, data });
        Ok(MediaId(self.media.len() - 1))
    }

    /// Registered image by id
    pub fn media(&self, id: MediaId) -> Option<&Media> {
        package::media_at(&self.media, id)
    }

    /// Register an image and size it to its 96-dpi size, scaled down to
    /// `max_width` if wider
    pub fn inline_image(&mut self, data: Vec<u8>, max_width: Length, name: &str) -> Result<InlineImage> {
        let (width_px, height_px) = pixel_dimensions(&data)?;
        let media = self.add_image(data)?;
        let (width, height) = fit_width(width_px, height_px, max_width);
        Ok(InlineImage {
            media,
            width,
            height,
            name: name.to_string(),
        })
    }

    /// Names of all package entries, in order
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Raw bytes of a package entry as read (parts are serialized on save)
    pub fn entry(&self, name: &str) -> Option<&[u8]> {
        package::find_entry(&self.entries, name).map(|e| e.data.as_slice())
    }
}

fn xml_bytes(el: &XmlElement) -> Vec<u8> {
    // Serializing an in-memory tree into a Vec cannot fail.
    el.to_xml().map(String::into_bytes).unwrap_or_default()
}
