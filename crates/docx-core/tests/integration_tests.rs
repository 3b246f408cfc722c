//! Integration tests for docx-core
//!
//! These tests build small `.docx` packages by hand and run them through
//! the reader and writer.

use docx_core::{
    Block, Document, DocxError, Inline, Length, Paragraph, PartKind, Run, RunContent, RunFormat,
};
use pretty_assertions::assert_eq;
use std::io::{Cursor, Read, Write};

const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

fn content_types() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>
</Types>"#
        .to_string()
}

fn root_rels() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#
        .to_string()
}

fn document_rels() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
<Relationship Id="rId7" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/>
</Relationships>"#
        .to_string()
}

fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {NS}><w:body>{body}<w:sectPr><w:headerReference w:type="default" r:id="rId7"/></w:sectPr></w:body></w:document>"#
    )
}

fn header_xml(text: &str) -> String {
    format!(r#"<w:hdr {NS}><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:hdr>"#)
}

/// Build a package with a body, a header and a styles part
fn create_test_docx(body: &str) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();
    let entries = [
        ("[Content_Types].xml", content_types()),
        ("_rels/.rels", root_rels()),
        ("word/document.xml", document_xml(body)),
        ("word/_rels/document.xml.rels", document_rels()),
        ("word/header1.xml", header_xml("Cabeçalho")),
        ("word/styles.xml", format!("<w:styles {NS}/>")),
    ];
    for (name, data) in entries {
        zip.start_file(name, options).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn read_entry(bytes: &[u8], name: &str) -> Option<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut out = String::new();
    file.read_to_string(&mut out).unwrap();
    Some(out)
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::new(width, height);
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn test_open_reads_body_and_header() {
    let bytes = create_test_docx(
        r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>Olá </w:t></w:r><w:r><w:t>mundo</w:t></w:r></w:p>"#,
    );
    let doc = Document::from_bytes(&bytes).unwrap();

    assert_eq!(doc.body.text(), "Olá mundo");
    assert_eq!(doc.headers.len(), 1);
    assert_eq!(doc.headers[0].name(), "word/header1.xml");
    assert_eq!(doc.headers[0].kind(), PartKind::Header);
    assert_eq!(doc.headers[0].text(), "Cabeçalho");
    assert!(doc.footers.is_empty());

    let paragraph = doc.body.paragraphs()[0];
    assert!(paragraph.properties.is_some());
    let runs: Vec<&Run> = paragraph.runs().collect();
    assert_eq!(runs[0].format, RunFormat::bold());
    assert!(runs[1].format.is_plain());
}

#[test]
fn test_roundtrip_preserves_content_and_unknown_parts() {
    let bytes = create_test_docx(
        r#"<w:p><w:bookmarkStart w:id="0" w:name="x"/><w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve">a  b</w:t><w:tab/><w:t>c</w:t></w:r><w:bookmarkEnd w:id="0"/></w:p>"#,
    );
    let doc = Document::from_bytes(&bytes).unwrap();
    let saved = doc.to_bytes().unwrap();
    let reopened = Document::from_bytes(&saved).unwrap();

    assert_eq!(reopened.body.blocks, doc.body.blocks);
    assert_eq!(reopened.headers[0].blocks, doc.headers[0].blocks);
    assert_eq!(reopened.body.text(), "a  b\tc");
    assert_eq!(
        read_entry(&saved, "word/styles.xml"),
        read_entry(&bytes, "word/styles.xml")
    );

    let names: Vec<&str> = reopened.entry_names().collect();
    assert_eq!(
        names,
        vec![
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/_rels/document.xml.rels",
            "word/header1.xml",
            "word/styles.xml",
        ]
    );
}

#[test]
fn test_nested_tables() {
    let bytes = create_test_docx(
        r#"<w:tbl><w:tblPr/><w:tr><w:tc><w:tcPr/><w:p><w:r><w:t>outer</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:tc></w:tr></w:tbl></w:tc></w:tr></w:tbl>"#,
    );
    let mut doc = Document::from_bytes(&bytes).unwrap();
    assert_eq!(doc.body.text(), "outer\ninner");

    for paragraph in doc.body.paragraphs_mut() {
        let text = paragraph.text().to_uppercase();
        paragraph.collapse_text(&text);
    }
    let reopened = Document::from_bytes(&doc.to_bytes().unwrap()).unwrap();
    assert_eq!(reopened.body.text(), "OUTER\nINNER");

    let Block::Table(table) = &reopened.body.blocks[0] else {
        panic!("expected a table");
    };
    assert_eq!(table.properties.len(), 1);
    assert!(table.rows[0].cells[0].properties.is_some());
}

#[test]
fn test_inline_image_is_packaged() {
    let bytes = create_test_docx(r#"<w:p><w:r><w:t>logo</w:t></w:r></w:p>"#);
    let mut doc = Document::from_bytes(&bytes).unwrap();

    let image = doc
        .inline_image(png_bytes(40, 20), Length::from_mm(150.0), "Imagem")
        .unwrap();
    assert_eq!(image.width, Length::from_px(40));
    assert_eq!(image.height, Length::from_px(20));
    doc.push_paragraph(Paragraph::from_runs([Run::image(image)]));

    let saved = doc.to_bytes().unwrap();
    let types = read_entry(&saved, "[Content_Types].xml").unwrap();
    assert!(types.contains(r#"Extension="png""#));

    let rels = read_entry(&saved, "word/_rels/document.xml.rels").unwrap();
    assert!(rels.contains(r#"Target="media/image1.png""#));
    assert!(rels.contains(r#"Id="rIdImg1""#));
    assert!(rels.contains(r#"Id="rId7""#));

    let media = read_entry_bytes(&saved, "word/media/image1.png").unwrap();
    assert_eq!(media, png_bytes(40, 20));

    let document = read_entry(&saved, "word/document.xml").unwrap();
    assert!(document.contains(r#"r:embed="rIdImg1""#));

    // The drawing survives a second round trip as opaque run content.
    let reopened = Document::from_bytes(&saved).unwrap();
    let last = reopened.body.paragraphs().last().copied().unwrap();
    let run = last.runs().next().unwrap();
    assert!(matches!(&run.content[0], RunContent::Other(el) if el.name == "w:drawing"));
}

fn read_entry_bytes(bytes: &[u8], name: &str) -> Option<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut out = Vec::new();
    file.read_to_end(&mut out).unwrap();
    Some(out)
}

#[test]
fn test_new_document_with_header_and_footer() {
    let mut doc = Document::new();
    doc.push_paragraph(Paragraph::with_text("corpo"));
    doc.add_header(vec![Block::Paragraph(Paragraph::with_text("topo"))])
        .unwrap();
    doc.add_footer(vec![Block::Paragraph(Paragraph::with_text("rodapé"))])
        .unwrap();

    let reopened = Document::from_bytes(&doc.to_bytes().unwrap()).unwrap();
    assert_eq!(reopened.body.text(), "corpo");
    assert_eq!(reopened.headers[0].text(), "topo");
    assert_eq!(reopened.footers[0].text(), "rodapé");
    assert_eq!(reopened.footers[0].name(), "word/footer1.xml");
}

#[test]
fn test_content_controls_and_wrapped_runs() {
    let bytes = create_test_docx(concat!(
        r#"<w:sdt><w:sdtPr><w:alias w:val="Cliente"/></w:sdtPr><w:sdtContent>"#,
        r#"<w:p><w:r><w:t xml:space="preserve">Cliente: {{ CLIENTE }}</w:t></w:r></w:p>"#,
        r#"</w:sdtContent></w:sdt>"#,
        r#"<w:p><w:r><w:t xml:space="preserve">Site: </w:t></w:r>"#,
        r#"<w:hyperlink r:id="rId9"><w:r><w:t>{{ CLIENTE }}</w:t></w:r></w:hyperlink>"#,
        r#"<w:ins w:id="1" w:author="Ana"><w:r><w:t xml:space="preserve"> novo</w:t></w:r></w:ins>"#,
        r#"<w:del w:id="2" w:author="Ana"><w:r><w:delText> velho</w:delText></w:r></w:del></w:p>"#,
    ));
    let mut doc = Document::from_bytes(&bytes).unwrap();

    let texts: Vec<String> = doc.body.paragraphs().iter().map(|p| p.text()).collect();
    assert_eq!(texts, vec!["Cliente: {{ CLIENTE }}", "Site: {{ CLIENTE }} novo"]);
    let Block::Control(control) = &doc.body.blocks[0] else {
        panic!("content control not modelled: {:?}", doc.body.blocks[0]);
    };
    assert_eq!(control.properties[0].name, "w:sdtPr");
    let linked = doc.body.paragraphs()[1];
    assert!(matches!(&linked.content[1], Inline::Group(g) if g.element.attr("r:id") == Some("rId9")));
    assert!(matches!(&linked.content[3], Inline::Other(el) if el.name == "w:del"));

    for paragraph in doc.body.paragraphs_mut() {
        let text = paragraph.text().replace("{{ CLIENTE }}", "Maria");
        paragraph.collapse_text(&text);
    }
    let saved = doc.to_bytes().unwrap();

    let xml = read_entry(&saved, "word/document.xml").unwrap();
    assert!(xml.contains("<w:sdtContent>"));
    assert!(xml.contains(r#"<w:hyperlink r:id="rId9">"#));
    assert!(xml.contains("<w:delText> velho</w:delText>"));
    assert!(!xml.contains("{{ CLIENTE }}"));

    let reopened = Document::from_bytes(&saved).unwrap();
    let texts: Vec<String> = reopened.body.paragraphs().iter().map(|p| p.text()).collect();
    assert_eq!(texts, vec!["Cliente: Maria", "Site: Maria novo"]);
    assert!(matches!(&reopened.body.blocks[0], Block::Control(_)));
}

#[test]
fn test_invalid_packages() {
    assert!(matches!(
        Document::from_bytes(b"not a zip"),
        Err(DocxError::Zip(_))
    ));

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("_rels/.rels", zip::write::FileOptions::default())
        .unwrap();
    zip.write_all(root_rels().as_bytes()).unwrap();
    let bytes = zip.finish().unwrap().into_inner();
    assert!(matches!(
        Document::from_bytes(&bytes),
        Err(DocxError::MissingPart(name)) if name == "word/document.xml"
    ));

    assert!(Document::open("/nonexistent/file.docx").is_err());
}
