//! OOXML package codec: zip entries, relationships, content types and the
//! conversion between part XML and the document model

use crate::document::{Document, Entry, Part, PartKind};
use crate::image::{drawing_element, Media, MediaId};
use crate::model::{
    Block, Cell, ContentControl, Inline, InlineGroup, Paragraph, Row, Run, RunContent, RunFormat,
    Table,
};
use crate::xml::{XmlElement, XmlNode};
use crate::{DocxError, Result};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub(crate) const CONTENT_TYPES: &str = "[Content_Types].xml";
pub(crate) const ROOT_RELS: &str = "_rels/.rels";
pub(crate) const DEFAULT_MAIN_PART: &str = "word/document.xml";

pub(crate) const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const NS_R: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_WP: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub(crate) const NS_PACKAGE_RELS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
pub(crate) const NS_CONTENT_TYPES: &str =
    "http://schemas.openxmlformats.org/package/2006/content-types";

pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const REL_HEADER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
pub(crate) const REL_FOOTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

pub(crate) const CT_MAIN: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
pub(crate) const CT_HEADER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
pub(crate) const CT_FOOTER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
pub(crate) const CT_RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// A package relationship (`Relationship` element)
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub id: String,
    pub kind: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    fn from_element(el: &XmlElement) -> Option<Self> {
        Some(Self {
            id: el.attr("Id")?.to_string(),
            kind: el.attr("Type")?.to_string(),
            target: el.attr("Target")?.to_string(),
            external: el.attr("TargetMode") == Some("External"),
        })
    }

    pub fn to_element(&self) -> XmlElement {
        let el = XmlElement::new("Relationship")
            .with_attr("Id", self.id.as_str())
            .with_attr("Type", self.kind.as_str())
            .with_attr("Target", self.target.as_str());
        if self.external {
            el.with_attr("TargetMode", "External")
        } else {
            el
        }
    }
}

/// Read a `.docx` package
pub(crate) fn read(bytes: &[u8]) -> Result<Document> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        entries.push(Entry {
            name: file.name().to_string(),
            data,
        });
    }

    let main = main_part_name(&entries)?;
    let body = Part::from_xml(
        main.clone(),
        PartKind::Body,
        XmlElement::parse(&entry_text(&entries, &main)?)?,
    )?;

    let mut headers = Vec::new();
    let mut footers = Vec::new();
    for rel in relationships(&entries, &main)? {
        if rel.external {
            continue;
        }
        let kind = if rel.kind == REL_HEADER {
            PartKind::Header
        } else if rel.kind == REL_FOOTER {
            PartKind::Footer
        } else {
            continue;
        };
        let name = resolve_target(&main, &rel.target);
        let root = XmlElement::parse(&entry_text(&entries, &name)?)?;
        let part = Part::from_xml(name, kind, root)?;
        match kind {
            PartKind::Header => headers.push(part),
            _ => footers.push(part),
        }
    }

    debug!(
        "opened package: {} entries, {} headers, {} footers",
        entries.len(),
        headers.len(),
        footers.len()
    );

    Ok(Document {
        body,
        headers,
        footers,
        entries,
        media: Vec::new(),
    })
}

/// Write a `.docx` package
pub(crate) fn write(doc: &Document) -> Result<Vec<u8>> {
    let media_names = media_names(doc);
    let mut next_drawing_id = max_drawing_id(doc) + 1;
    let mut replaced: HashMap<String, Vec<u8>> = HashMap::new();
    let mut added: Vec<(String, Vec<u8>)> = Vec::new();

    for part in doc.parts() {
        let rels_name = rels_name(&part.name);
        let mut rels_root = match find_entry(&doc.entries, &rels_name) {
            Some(entry) => XmlElement::parse(&utf8(&entry.data)?)?,
            None => empty_relationships(),
        };
        let existing: HashSet<String> = rels_root
            .elements()
            .filter_map(|el| el.attr("Id"))
            .map(str::to_string)
            .collect();

        let mut writer = PartWriter {
            part_dir: parent_dir(&part.name),
            media_names: &media_names,
            existing_ids: existing,
            new_rels: Vec::new(),
            rel_by_media: HashMap::new(),
            next_drawing_id: &mut next_drawing_id,
        };
        let xml = part.to_xml(&mut writer)?;
        replaced.insert(part.name.clone(), xml.to_xml()?.into_bytes());

        if !writer.new_rels.is_empty() {
            for rel in &writer.new_rels {
                rels_root.children.push(XmlNode::Element(rel.to_element()));
            }
            let data = rels_root.to_xml()?.into_bytes();
            if find_entry(&doc.entries, &rels_name).is_some() {
                replaced.insert(rels_name, data);
            } else {
                added.push((rels_name, data));
            }
        }
    }

    if !doc.media.is_empty() {
        let mut types = XmlElement::parse(&entry_text(&doc.entries, CONTENT_TYPES)?)?;
        for media in &doc.media {
            ensure_default_content_type(
                &mut types,
                media.format.extension(),
                media.format.content_type(),
            );
        }
        replaced.insert(CONTENT_TYPES.to_string(), types.to_xml()?.into_bytes());

        for (media, name) in doc.media.iter().zip(&media_names) {
            added.push((name.clone(), media.data.clone()));
        }
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in &doc.entries {
        let data = replaced.get(&entry.name).unwrap_or(&entry.data);
        zip.start_file(entry.name.as_str(), options)?;
        zip.write_all(data)?;
    }
    for (name, data) in &added {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(data)?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Serialization state for one part: relationship ids and drawing ids
pub(crate) struct PartWriter<'a> {
    part_dir: String,
    media_names: &'a [String],
    existing_ids: HashSet<String>,
    new_rels: Vec<Relationship>,
    rel_by_media: HashMap<MediaId, String>,
    next_drawing_id: &'a mut u32,
}

impl PartWriter<'_> {
    fn image_relationship(&mut self, media: MediaId) -> Result<String> {
        if let Some(id) = self.rel_by_media.get(&media) {
            return Ok(id.clone());
        }
        let name = self
            .media_names
            .get(media.0)
            .ok_or_else(|| DocxError::Malformed(format!("unknown media #{}", media.0)))?;

        let mut n = self.new_rels.len() + 1;
        let id = loop {
            let candidate = format!("rIdImg{n}");
            if !self.existing_ids.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };

        self.new_rels.push(Relationship {
            id: id.clone(),
            kind: REL_IMAGE.to_string(),
            target: relative_target(&self.part_dir, name),
            external: false,
        });
        self.existing_ids.insert(id.clone());
        self.rel_by_media.insert(media, id.clone());
        Ok(id)
    }

    fn drawing_id(&mut self) -> u32 {
        let id = *self.next_drawing_id;
        *self.next_drawing_id += 1;
        id
    }
}

impl Part {
    /// Split a part's root element into the model
    pub(crate) fn from_xml(name: String, kind: PartKind, mut root: XmlElement) -> Result<Part> {
        let container = match kind {
            PartKind::Body => root.find_mut("w:body").ok_or_else(|| {
                DocxError::Malformed(format!("{name}: document has no <w:body>"))
            })?,
            PartKind::Header | PartKind::Footer => &mut root,
        };
        let children = std::mem::take(&mut container.children);
        let blocks = blocks_from(children);

        Ok(Part {
            name,
            kind,
            root,
            blocks,
        })
    }

    /// Rebuild the part's root element from the model
    pub(crate) fn to_xml(&self, writer: &mut PartWriter<'_>) -> Result<XmlElement> {
        let mut root = self.root.clone();
        let container = match self.kind {
            PartKind::Body => root.find_mut("w:body").ok_or_else(|| {
                DocxError::Malformed(format!("{}: document has no <w:body>", self.name))
            })?,
            PartKind::Header | PartKind::Footer => &mut root,
        };

        let mut children = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            children.push(XmlNode::Element(block_xml(block, writer)?));
        }
        container.children = children;

        Ok(root)
    }
}

fn blocks_from(children: Vec<XmlNode>) -> Vec<Block> {
    children
        .into_iter()
        .filter_map(|node| match node {
            XmlNode::Element(el) => Some(block_from(el)),
            XmlNode::Text(_) => None,
        })
        .collect()
}

fn block_from(el: XmlElement) -> Block {
    match el.name.as_str() {
        "w:p" => Block::Paragraph(paragraph_from(el)),
        "w:tbl" => Block::Table(table_from(el)),
        "w:sdt" => Block::Control(control_from(el)),
        _ => Block::Other(el),
    }
}

fn control_from(el: XmlElement) -> ContentControl {
    let mut control = ContentControl::default();
    for child in child_elements(el) {
        match child.name.as_str() {
            "w:sdtContent" => control.blocks.extend(child_elements(child).map(block_from)),
            _ => control.properties.push(child),
        }
    }
    control
}

fn child_elements(el: XmlElement) -> impl Iterator<Item = XmlElement> {
    el.children.into_iter().filter_map(|node| match node {
        XmlNode::Element(child) => Some(child),
        XmlNode::Text(_) => None,
    })
}

fn paragraph_from(el: XmlElement) -> Paragraph {
    let mut paragraph = Paragraph::new();
    for child in child_elements(el) {
        match child.name.as_str() {
            "w:pPr" => paragraph.properties = Some(child),
            _ => paragraph.content.push(inline_from(child)),
        }
    }
    paragraph
}

/// Elements whose content is more paragraph content
const INLINE_WRAPPERS: &[&str] = &["w:hyperlink", "w:ins", "w:smartTag", "w:customXml", "w:sdt"];

fn inline_from(el: XmlElement) -> Inline {
    match el.name.as_str() {
        "w:r" => Inline::Run(run_from(el)),
        name if INLINE_WRAPPERS.contains(&name) => Inline::Group(group_from(el)),
        _ => Inline::Other(el),
    }
}

/// Split a wrapper into its shell (attributes, `*Pr` children) and content
fn group_from(mut el: XmlElement) -> InlineGroup {
    let mut content = Vec::new();
    for node in std::mem::take(&mut el.children) {
        match node {
            XmlNode::Element(child) if child.name == "w:sdtContent" => {
                content.extend(child_elements(child).map(inline_from))
            }
            XmlNode::Element(child) if child.name.ends_with("Pr") => {
                el.children.push(XmlNode::Element(child))
            }
            XmlNode::Element(child) => content.push(inline_from(child)),
            XmlNode::Text(_) => {}
        }
    }
    InlineGroup::new(el, content)
}

fn run_from(el: XmlElement) -> Run {
    let mut run = Run::default();
    for child in child_elements(el) {
        let item = match child.name.as_str() {
            "w:rPr" => {
                run.format = RunFormat::from_properties(child);
                continue;
            }
            "w:t" => RunContent::Text(child.text()),
            "w:tab" => RunContent::Tab,
            "w:br" if is_plain_break(&child) => RunContent::Break,
            _ => RunContent::Other(child),
        };
        run.content.push(item);
    }
    run
}

/// A `w:br` that is an ordinary line break (not a page or column break)
fn is_plain_break(el: &XmlElement) -> bool {
    el.attributes.is_empty() || el.attributes == [("w:type".to_string(), "textWrapping".to_string())]
}

fn table_from(el: XmlElement) -> Table {
    let mut table = Table::default();
    for child in child_elements(el) {
        match child.name.as_str() {
            "w:tr" => table.rows.push(row_from(child)),
            _ => table.properties.push(child),
        }
    }
    table
}

fn row_from(el: XmlElement) -> Row {
    let mut row = Row::default();
    for child in child_elements(el) {
        match child.name.as_str() {
            "w:tc" => row.cells.push(cell_from(child)),
            _ => row.properties.push(child),
        }
    }
    row
}

fn cell_from(el: XmlElement) -> Cell {
    let mut cell = Cell::default();
    for child in child_elements(el) {
        match child.name.as_str() {
            "w:tcPr" => cell.properties = Some(child),
            _ => cell.blocks.push(block_from(child)),
        }
    }
    cell
}

fn block_xml(block: &Block, writer: &mut PartWriter<'_>) -> Result<XmlElement> {
    match block {
        Block::Paragraph(p) => paragraph_xml(p, writer),
        Block::Table(t) => table_xml(t, writer),
        Block::Control(control) => control_xml(control, writer),
        Block::Other(el) => Ok(el.clone()),
    }
}

fn control_xml(control: &ContentControl, writer: &mut PartWriter<'_>) -> Result<XmlElement> {
    let mut el = XmlElement::new("w:sdt");
    for property in &control.properties {
        el = el.with_child(property.clone());
    }
    let mut content = XmlElement::new("w:sdtContent");
    for block in &control.blocks {
        content = content.with_child(block_xml(block, writer)?);
    }
    Ok(el.with_child(content))
}

fn paragraph_xml(paragraph: &Paragraph, writer: &mut PartWriter<'_>) -> Result<XmlElement> {
    let mut el = XmlElement::new("w:p");
    if let Some(properties) = &paragraph.properties {
        el = el.with_child(properties.clone());
    }
    for inline in &paragraph.content {
        el = el.with_child(inline_xml(inline, writer)?);
    }
    Ok(el)
}

fn inline_xml(inline: &Inline, writer: &mut PartWriter<'_>) -> Result<XmlElement> {
    match inline {
        Inline::Run(run) => run_xml(run, writer),
        Inline::Group(group) => group_xml(group, writer),
        Inline::Other(other) => Ok(other.clone()),
    }
}

fn group_xml(group: &InlineGroup, writer: &mut PartWriter<'_>) -> Result<XmlElement> {
    let mut content = Vec::with_capacity(group.content.len());
    for inline in &group.content {
        content.push(XmlNode::Element(inline_xml(inline, writer)?));
    }

    let mut el = group.element.clone();
    if el.name == "w:sdt" {
        let mut sdt_content = XmlElement::new("w:sdtContent");
        sdt_content.children = content;
        el = el.with_child(sdt_content);
    } else {
        el.children.extend(content);
    }
    Ok(el)
}

fn run_xml(run: &Run, writer: &mut PartWriter<'_>) -> Result<XmlElement> {
    let mut el = XmlElement::new("w:r");
    if let Some(properties) = run.format.properties() {
        el = el.with_child(properties.clone());
    }
    for item in &run.content {
        let child = match item {
            RunContent::Text(text) => XmlElement::new("w:t")
                .with_attr("xml:space", "preserve")
                .with_text(text.as_str()),
            RunContent::Tab => XmlElement::new("w:tab"),
            RunContent::Break => XmlElement::new("w:br"),
            RunContent::Image(image) => {
                let rel_id = writer.image_relationship(image.media)?;
                let drawing_id = writer.drawing_id();
                drawing_element(image, &rel_id, drawing_id)
            }
            RunContent::Other(other) => other.clone(),
        };
        el = el.with_child(child);
    }
    Ok(el)
}

fn table_xml(table: &Table, writer: &mut PartWriter<'_>) -> Result<XmlElement> {
    let mut el = XmlElement::new("w:tbl");
    for property in &table.properties {
        el = el.with_child(property.clone());
    }
    for row in &table.rows {
        let mut row_el = XmlElement::new("w:tr");
        for property in &row.properties {
            row_el = row_el.with_child(property.clone());
        }
        for cell in &row.cells {
            let mut cell_el = XmlElement::new("w:tc");
            if let Some(properties) = &cell.properties {
                cell_el = cell_el.with_child(properties.clone());
            }
            for block in &cell.blocks {
                cell_el = cell_el.with_child(block_xml(block, writer)?);
            }
            row_el = row_el.with_child(cell_el);
        }
        el = el.with_child(row_el);
    }
    Ok(el)
}

/// Highest `wp:docPr` id already used by drawings in the document
fn max_drawing_id(doc: &Document) -> u32 {
    let mut max = 0;
    let mut visit = |el: &XmlElement| {
        if el.name == "wp:docPr" {
            if let Some(id) = el.attr("id").and_then(|v| v.parse::<u32>().ok()) {
                max = max.max(id);
            }
        }
    };

    for part in doc.parts() {
        for block in &part.blocks {
            visit_opaque(block, &mut visit);
        }
    }
    max
}

fn visit_opaque<'a>(block: &'a Block, visit: &mut dyn FnMut(&'a XmlElement)) {
    match block {
        Block::Other(el) => el.walk(visit),
        Block::Table(table) => {
            for row in &table.rows {
                for cell in &row.cells {
                    for block in &cell.blocks {
                        visit_opaque(block, visit);
                    }
                }
            }
        }
        Block::Control(control) => {
            for block in &control.blocks {
                visit_opaque(block, visit);
            }
        }
        Block::Paragraph(p) => visit_opaque_inlines(&p.content, visit),
    }
}

fn visit_opaque_inlines<'a>(content: &'a [Inline], visit: &mut dyn FnMut(&'a XmlElement)) {
    for inline in content {
        match inline {
            Inline::Other(el) => el.walk(visit),
            Inline::Group(group) => visit_opaque_inlines(&group.content, visit),
            Inline::Run(run) => {
                for item in &run.content {
                    if let RunContent::Other(el) = item {
                        el.walk(visit);
                    }
                }
            }
        }
    }
}

/// Unique zip entry names for the document's added media
fn media_names(doc: &Document) -> Vec<String> {
    let taken: HashSet<&str> = doc.entries.iter().map(|e| e.name.as_str()).collect();
    let mut names = Vec::with_capacity(doc.media.len());
    let mut n = 1;

    for media in &doc.media {
        let name = loop {
            let candidate = format!("word/media/image{n}.{}", media.format.extension());
            n += 1;
            if !taken.contains(candidate.as_str()) {
                break candidate;
            }
        };
        names.push(name);
    }
    names
}

pub(crate) fn find_entry<'a>(entries: &'a [Entry], name: &str) -> Option<&'a Entry> {
    entries.iter().find(|e| e.name == name)
}

pub(crate) fn entry_text(entries: &[Entry], name: &str) -> Result<String> {
    let entry = find_entry(entries, name).ok_or_else(|| DocxError::MissingPart(name.to_string()))?;
    utf8(&entry.data)
}

fn utf8(data: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(data).map_err(|e| DocxError::Malformed(e.to_string()))?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Main document part named by the package relationships
fn main_part_name(entries: &[Entry]) -> Result<String> {
    let Some(entry) = find_entry(entries, ROOT_RELS) else {
        return Ok(DEFAULT_MAIN_PART.to_string());
    };
    let rels = XmlElement::parse(&utf8(&entry.data)?)?;
    let target = rels
        .elements()
        .filter_map(Relationship::from_element)
        .find(|rel| rel.kind == REL_OFFICE_DOCUMENT)
        .map(|rel| rel.target.trim_start_matches('/').to_string());
    Ok(target.unwrap_or_else(|| DEFAULT_MAIN_PART.to_string()))
}

/// Relationships of a part (empty when it has no `.rels` entry)
pub(crate) fn relationships(entries: &[Entry], part_name: &str) -> Result<Vec<Relationship>> {
    match find_entry(entries, &rels_name(part_name)) {
        Some(entry) => {
            let root = XmlElement::parse(&utf8(&entry.data)?)?;
            Ok(root.elements().filter_map(Relationship::from_element).collect())
        }
        None => Ok(Vec::new()),
    }
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`
pub(crate) fn rels_name(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part_name}.rels"),
    }
}

fn parent_dir(part_name: &str) -> String {
    part_name
        .rsplit_once('/')
        .map(|(dir, _)| dir.to_string())
        .unwrap_or_default()
}

/// Resolve a relationship target against the source part's directory
pub(crate) fn resolve_target(part_name: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let dir = parent_dir(part_name);
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Target of `entry_name` as seen from a part in `part_dir`
fn relative_target(part_dir: &str, entry_name: &str) -> String {
    match entry_name.strip_prefix(&format!("{part_dir}/")) {
        Some(relative) if !part_dir.is_empty() => relative.to_string(),
        _ => format!("/{entry_name}"),
    }
}

pub(crate) fn empty_relationships() -> XmlElement {
    XmlElement::new("Relationships").with_attr("xmlns", NS_PACKAGE_RELS)
}

/// Add a `Default` content type for an extension unless one exists
fn ensure_default_content_type(types: &mut XmlElement, extension: &str, content_type: &str) {
    let exists = types.elements().any(|el| {
        el.name == "Default"
            && el
                .attr("Extension")
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
    });
    if !exists {
        types.children.push(XmlNode::Element(
            XmlElement::new("Default")
                .with_attr("Extension", extension)
                .with_attr("ContentType", content_type),
        ));
    }
}

/// Add an `Override` content type for a part
pub(crate) fn add_override_content_type(types: &mut XmlElement, part_name: &str, content_type: &str) {
    let part = format!("/{part_name}");
    types.children.retain(|node| match node {
        XmlNode::Element(el) => !(el.name == "Override" && el.attr("PartName") == Some(part.as_str())),
        XmlNode::Text(_) => true,
    });
    types.children.push(XmlNode::Element(
        XmlElement::new("Override")
            .with_attr("PartName", part)
            .with_attr("ContentType", content_type),
    ));
}

/// Media entry lookup used by tests and the document API
pub(crate) fn media_at(media: &[Media], id: MediaId) -> Option<&Media> {
    media.get(id.0)
}
