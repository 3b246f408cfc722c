//! Rich-text document model
//!
//! A part is a sequence of blocks; paragraphs hold runs; tables hold rows of
//! cells which again hold blocks, so tables nest to any depth. Content
//! controls and run wrappers (hyperlinks, tracked insertions) are read
//! through so their text stays visible. Anything the model does not
//! interpret is kept as an opaque [`XmlElement`].

use crate::image::InlineImage;
use crate::xml::XmlElement;

/// Opaque formatting state of a run (the `w:rPr` element)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunFormat(Option<XmlElement>);

impl RunFormat {
    /// No formatting
    pub fn plain() -> Self {
        Self(None)
    }

    /// Formatting taken from a `w:rPr` element
    pub fn from_properties(properties: XmlElement) -> Self {
        Self(Some(properties))
    }

    /// Bold text
    pub fn bold() -> Self {
        Self::plain().with_property(XmlElement::new("w:b"))
    }

    /// Italic text
    pub fn italic() -> Self {
        Self::plain().with_property(XmlElement::new("w:i"))
    }

    /// Single underline
    pub fn underline() -> Self {
        Self::plain().with_property(XmlElement::new("w:u").with_attr("w:val", "single"))
    }

    /// Add one property element (e.g. `w:b`) to this format
    pub fn with_property(self, property: XmlElement) -> Self {
        let properties = self.0.unwrap_or_else(|| XmlElement::new("w:rPr"));
        Self(Some(properties.with_child(property)))
    }

    /// The `w:rPr` element, if any
    pub fn properties(&self) -> Option<&XmlElement> {
        self.0.as_ref()
    }

    pub fn is_plain(&self) -> bool {
        self.0.is_none()
    }
}

/// One piece of run content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunContent {
    /// Literal text (`w:t`)
    Text(String),
    /// Tab character (`w:tab`), read as `\t`
    Tab,
    /// Line break (`w:br`), read as `\n`
    Break,
    /// Image added through [`crate::Document::add_image`]
    Image(InlineImage),
    /// Any other run child, kept verbatim
    Other(XmlElement),
}

impl RunContent {
    fn is_text(&self) -> bool {
        matches!(self, RunContent::Text(_) | RunContent::Tab | RunContent::Break)
    }
}

/// A contiguous span of content sharing one format
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Run {
    pub format: RunFormat,
    pub content: Vec<RunContent>,
}

impl Run {
    /// Unformatted text run
    pub fn new(text: &str) -> Self {
        Self::styled(text, RunFormat::plain())
    }

    /// Text run with the given format
    pub fn styled(text: &str, format: RunFormat) -> Self {
        Self {
            format,
            content: text_content(text),
        }
    }

    /// Run holding a single inline image
    pub fn image(image: InlineImage) -> Self {
        Self {
            format: RunFormat::plain(),
            content: vec![RunContent::Image(image)],
        }
    }

    /// The run's text, with tabs as `\t` and breaks as `\n`
    pub fn text(&self) -> String {
        let mut out = String::new();
        for item in &self.content {
            match item {
                RunContent::Text(t) => out.push_str(t),
                RunContent::Tab => out.push('\t'),
                RunContent::Break => out.push('\n'),
                RunContent::Image(_) | RunContent::Other(_) => {}
            }
        }
        out
    }

    /// A copy of this run with its text replaced
    ///
    /// Formatting and non-text content are kept; the new text takes the
    /// place of the first text item.
    pub fn with_text(&self, text: &str) -> Run {
        let mut content = Vec::with_capacity(self.content.len() + 1);
        let mut placed = false;

        for item in &self.content {
            if item.is_text() {
                if !placed {
                    content.extend(text_content(text));
                    placed = true;
                }
            } else {
                content.push(item.clone());
            }
        }
        if !placed {
            let mut with_text = text_content(text);
            with_text.extend(content);
            content = with_text;
        }

        Run {
            format: self.format.clone(),
            content,
        }
    }

    /// Images held by this run
    pub fn images(&self) -> impl Iterator<Item = &InlineImage> {
        self.content.iter().filter_map(|item| match item {
            RunContent::Image(image) => Some(image),
            _ => None,
        })
    }
}

/// Split text into run content, mapping `\t` and `\n` to tab and break
fn text_content(text: &str) -> Vec<RunContent> {
    let mut content = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        let special = match ch {
            '\t' => Some(RunContent::Tab),
            '\n' => Some(RunContent::Break),
            _ => None,
        };
        match special {
            Some(item) => {
                if !current.is_empty() {
                    content.push(RunContent::Text(std::mem::take(&mut current)));
                }
                content.push(item);
            }
            None => current.push(ch),
        }
    }
    if !current.is_empty() {
        content.push(RunContent::Text(current));
    }

    content
}

/// Paragraph-level content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Run(Run),
    /// Hyperlink, tracked insertion, smart tag or inline content control
    Group(InlineGroup),
    /// Bookmarks, proofing marks, deleted runs...
    Other(XmlElement),
}

/// An element wrapping paragraph content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineGroup {
    /// The wrapper with its attributes and property children (`w:sdtPr`,
    /// `w:smartTagPr`) but without its content
    pub element: XmlElement,
    pub content: Vec<Inline>,
}

impl InlineGroup {
    pub fn new(element: XmlElement, content: Vec<Inline>) -> Self {
        Self { element, content }
    }
}

fn collect_runs<'a>(content: &'a [Inline], out: &mut Vec<&'a Run>) {
    for inline in content {
        match inline {
            Inline::Run(run) => out.push(run),
            Inline::Group(group) => collect_runs(&group.content, out),
            Inline::Other(_) => {}
        }
    }
}

/// Give the first run `text` and empty the text of every later one
fn collapse_runs(content: &mut [Inline], text: &str, first: &mut bool) {
    for inline in content.iter_mut() {
        match inline {
            Inline::Run(run) => {
                *run = run.with_text(if *first { text } else { "" });
                *first = false;
            }
            Inline::Group(group) => collapse_runs(&mut group.content, text, first),
            Inline::Other(_) => {}
        }
    }
}

/// A paragraph (`w:p`)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Paragraph {
    /// Paragraph properties (`w:pPr`)
    pub properties: Option<XmlElement>,
    pub content: Vec<Inline>,
}

impl Paragraph {
    /// Empty paragraph
    pub fn new() -> Self {
        Self::default()
    }

    /// Paragraph made of the given runs
    pub fn from_runs(runs: impl IntoIterator<Item = Run>) -> Self {
        Self {
            properties: None,
            content: runs.into_iter().map(Inline::Run).collect(),
        }
    }

    /// Paragraph with a single unformatted run
    pub fn with_text(text: &str) -> Self {
        Self::from_runs([Run::new(text)])
    }

    /// Append a run
    pub fn push_run(&mut self, run: Run) {
        self.content.push(Inline::Run(run));
    }

    /// Runs of this paragraph in document order, wrapped ones included
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        let mut out = Vec::new();
        collect_runs(&self.content, &mut out);
        out.into_iter()
    }

    /// Effective text: the concatenation of all run texts
    pub fn text(&self) -> String {
        self.runs().map(Run::text).collect()
    }

    /// Rebuild the runs so the whole paragraph text lives in the first run
    ///
    /// The first run keeps its format and receives `text`; every later run
    /// keeps its format and non-text content but loses its text. Runs inside
    /// a hyperlink or other wrapper stay inside it. A paragraph without runs
    /// gets one new unformatted run.
    pub fn collapse_text(&mut self, text: &str) {
        let mut first = true;
        collapse_runs(&mut self.content, text, &mut first);
        if first {
            self.push_run(Run::new(text));
        }
    }
}

/// A table cell (`w:tc`)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    /// Cell properties (`w:tcPr`)
    pub properties: Option<XmlElement>,
    pub blocks: Vec<Block>,
}

impl Cell {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            properties: None,
            blocks,
        }
    }
}

/// A table row (`w:tr`)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    /// Row-level elements other than cells (`w:trPr`, `w:tblPrEx`)
    pub properties: Vec<XmlElement>,
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            properties: Vec::new(),
            cells,
        }
    }
}

/// A table (`w:tbl`)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    /// Table-level elements other than rows (`w:tblPr`, `w:tblGrid`)
    pub properties: Vec<XmlElement>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            properties: Vec::new(),
            rows,
        }
    }
}

/// A block-level content control (`w:sdt`)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentControl {
    /// Children other than the content (`w:sdtPr`, `w:sdtEndPr`)
    pub properties: Vec<XmlElement>,
    /// The blocks inside `w:sdtContent`
    pub blocks: Vec<Block>,
}

impl ContentControl {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            properties: Vec::new(),
            blocks,
        }
    }
}

/// Body-level content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    Control(ContentControl),
    /// Section properties, bookmarks...
    Other(XmlElement),
}

/// Every paragraph in `blocks`, including those nested in tables and
/// content controls
pub fn paragraphs(blocks: &[Block]) -> Vec<&Paragraph> {
    let mut out = Vec::new();
    collect(blocks, &mut out);
    out
}

fn collect<'a>(blocks: &'a [Block], out: &mut Vec<&'a Paragraph>) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => out.push(p),
            Block::Table(table) => {
                for row in &table.rows {
                    for cell in &row.cells {
                        collect(&cell.blocks, out);
                    }
                }
            }
            Block::Control(control) => collect(&control.blocks, out),
            Block::Other(_) => {}
        }
    }
}

/// Every paragraph in `blocks`, mutably, in document order
pub fn paragraphs_mut(blocks: &mut [Block]) -> Vec<&mut Paragraph> {
    let mut out = Vec::new();
    collect_mut(blocks, &mut out);
    out
}

fn collect_mut<'a>(blocks: &'a mut [Block], out: &mut Vec<&'a mut Paragraph>) {
    for block in blocks.iter_mut() {
        match block {
            Block::Paragraph(p) => out.push(p),
            Block::Table(table) => {
                for row in table.rows.iter_mut() {
                    for cell in row.cells.iter_mut() {
                        collect_mut(&mut cell.blocks, out);
                    }
                }
            }
            Block::Control(control) => collect_mut(&mut control.blocks, out),
            Block::Other(_) => {}
        }
    }
}
