//! Integration tests for template filling

use docx_core::{
    Block, Cell, ContentControl, Document, Inline, InlineGroup, Length, Paragraph, Row, Run,
    RunFormat, Table, XmlElement,
};
use pretty_assertions::assert_eq;
use template::{
    fill, lint_tokens, place_image, scan_tokens, DocumentKind, FieldKey, PlaceholderMap,
    Traversal,
};

fn paragraph_texts(doc: &Document) -> Vec<String> {
    doc.parts()
        .iter()
        .flat_map(|part| part.paragraphs())
        .map(|p| p.text())
        .collect()
}

/// Body with a plain paragraph, a split token and a nested table; header
/// and footer with their own tokens
fn contract_template() -> Document {
    let mut doc = Document::new();
    doc.push_paragraph(Paragraph::with_text("CONTRATO DE LOCAÇÃO"));
    doc.push_paragraph(Paragraph::from_runs([
        Run::styled("Cliente: {{ CLI", RunFormat::bold()),
        Run::styled("ENTE }}", RunFormat::italic()),
        Run::styled(", Valor: {{ VALOR }}", RunFormat::underline()),
    ]));

    let inner = Table::new(vec![Row::new(vec![Cell::new(vec![Block::Paragraph(
        Paragraph::with_text("Modelo: {{ MODELO }}"),
    )])])]);
    let outer = Table::new(vec![Row::new(vec![
        Cell::new(vec![Block::Paragraph(Paragraph::with_text("CPF: {{ CPF }}"))]),
        Cell::new(vec![Block::Table(inner)]),
    ])]);
    doc.push_block(Block::Table(outer));

    doc.add_header(vec![Block::Paragraph(Paragraph::with_text(
        "Contrato de {{ CLIENTE }}",
    ))])
    .unwrap();
    doc.add_footer(vec![Block::Paragraph(Paragraph::with_text(
        "Emitido em {{ DATA }}",
    ))])
    .unwrap();
    doc
}

fn mapping() -> PlaceholderMap {
    let mut map = PlaceholderMap::new();
    map.insert_field("CLIENTE", "Maria Silva");
    map.insert_field(
        "VALOR",
        "R$ 1.234,50 (mil duzentos e trinta e quatro reais)",
    );
    map.insert_field("CPF", "123.456.789-01");
    map.insert_field("MODELO", "MP 301");
    map.insert_field("DATA", "20 de fevereiro de 2026");
    map
}

#[test]
fn test_end_to_end_scenario() {
    let mut doc = Document::new();
    doc.push_paragraph(Paragraph::with_text("Proposta comercial"));
    doc.push_paragraph(Paragraph::with_text(
        "Cliente: {{ CLIENTE }}, Valor: {{ VALOR }}",
    ));
    doc.push_paragraph(Paragraph::with_text("Atenciosamente"));

    let rewritten = fill(&mut doc, &mapping(), Traversal::Body);
    assert_eq!(rewritten, 1);
    assert_eq!(
        paragraph_texts(&doc),
        vec![
            "Proposta comercial",
            "Cliente: Maria Silva, Valor: R$ 1.234,50 (mil duzentos e trinta e quatro reais)",
            "Atenciosamente",
        ]
    );
}

#[test]
fn test_split_token_keeps_first_run_format() {
    let mut doc = contract_template();
    fill(&mut doc, &mapping(), Traversal::Body);

    let paragraph = doc.body.paragraphs()[1];
    let runs: Vec<&Run> = paragraph.runs().collect();
    assert_eq!(runs.len(), 3);
    assert_eq!(
        runs[0].text(),
        "Cliente: Maria Silva, Valor: R$ 1.234,50 (mil duzentos e trinta e quatro reais)"
    );
    assert_eq!(runs[0].format, RunFormat::bold());
    assert_eq!(runs[1].text(), "");
    assert_eq!(runs[1].format, RunFormat::italic());
    assert_eq!(runs[2].text(), "");
    assert_eq!(runs[2].format, RunFormat::underline());
}

#[test]
fn test_run_split_does_not_matter() {
    let text = "Cliente: {{ CLIENTE }}";
    let mut whole = Document::new();
    whole.push_paragraph(Paragraph::with_text(text));

    let mut split = Document::new();
    split.push_paragraph(Paragraph::from_runs(
        text.chars().map(|c| Run::new(&c.to_string())),
    ));

    fill(&mut whole, &mapping(), Traversal::Body);
    fill(&mut split, &mapping(), Traversal::Body);
    assert_eq!(paragraph_texts(&whole), paragraph_texts(&split));
    assert_eq!(paragraph_texts(&split), vec!["Cliente: Maria Silva"]);
}

#[test]
fn test_headers_only_with_body_and_headers() {
    let mut body_only = contract_template();
    fill(&mut body_only, &mapping(), Traversal::Body);
    assert_eq!(body_only.headers[0].text(), "Contrato de {{ CLIENTE }}");
    assert_eq!(body_only.footers[0].text(), "Emitido em {{ DATA }}");

    let mut everything = contract_template();
    fill(&mut everything, &mapping(), Traversal::BodyAndHeaders);
    assert_eq!(everything.headers[0].text(), "Contrato de Maria Silva");
    assert_eq!(
        everything.footers[0].text(),
        "Emitido em 20 de fevereiro de 2026"
    );
}

#[test]
fn test_nested_table_cells_are_filled() {
    let mut doc = contract_template();
    fill(&mut doc, &mapping(), Traversal::Body);
    let texts: Vec<String> = doc.body.paragraphs().iter().map(|p| p.text()).collect();
    assert!(texts.contains(&"CPF: 123.456.789-01".to_string()));
    assert!(texts.contains(&"Modelo: MP 301".to_string()));
}

#[test]
fn test_tokens_inside_controls_and_hyperlinks_are_filled() {
    let mut linked = Paragraph::from_runs([Run::new("Contato: ")]);
    linked.content.push(Inline::Group(InlineGroup::new(
        XmlElement::new("w:hyperlink").with_attr("r:id", "rId9"),
        vec![Inline::Run(Run::new("{{ CLIENTE }}"))],
    )));

    let mut doc = Document::new();
    doc.push_block(Block::Control(ContentControl::new(vec![Block::Paragraph(
        Paragraph::with_text("Modelo: {{ MODELO }}"),
    )])));
    doc.push_paragraph(linked);

    assert_eq!(fill(&mut doc, &mapping(), Traversal::Body), 2);
    assert_eq!(
        paragraph_texts(&doc),
        vec!["Modelo: MP 301", "Contato: Maria Silva"]
    );
}

#[test]
fn test_second_fill_is_noop() {
    let mut doc = contract_template();
    let first = fill(&mut doc, &mapping(), Traversal::BodyAndHeaders);
    assert_eq!(first, 5);

    let snapshot = doc.clone();
    let second = fill(&mut doc, &mapping(), Traversal::BodyAndHeaders);
    assert_eq!(second, 0);
    assert_eq!(doc.body.blocks, snapshot.body.blocks);
    assert_eq!(doc.headers[0].blocks, snapshot.headers[0].blocks);
}

#[test]
fn test_unchanged_paragraphs_keep_runs() {
    let mut doc = Document::new();
    let untouched = Paragraph::from_runs([
        Run::styled("{{ OUTRO }} ", RunFormat::bold()),
        Run::new("texto"),
    ]);
    doc.push_paragraph(untouched.clone());
    fill(&mut doc, &mapping(), Traversal::Body);
    assert_eq!(doc.body.paragraphs()[0], &untouched);
}

#[test]
fn test_image_without_payload_equals_fill() {
    let mut placed = contract_template();
    placed.push_paragraph(Paragraph::from_runs([
        Run::styled("Foto: {{ IMA", RunFormat::bold()),
        Run::new("GEM }}"),
    ]));
    let mut filled = placed.clone();

    let token = FieldKey::Imagem.token();
    place_image(
        &mut placed,
        &token,
        None,
        Length::from_mm(150.0),
        Traversal::BodyAndHeaders,
    )
    .unwrap();
    let mut map = PlaceholderMap::new();
    map.insert(token.as_str(), "");
    fill(&mut filled, &map, Traversal::BodyAndHeaders);

    for (a, b) in placed.parts().iter().zip(filled.parts().iter()) {
        assert_eq!(a.blocks, b.blocks);
    }
    assert_eq!(placed.body.paragraphs().last().unwrap().text(), "Foto: ");
}

#[test]
fn test_filled_document_survives_save() {
    let mut doc = contract_template();
    fill(&mut doc, &mapping(), Traversal::BodyAndHeaders);
    let reopened = Document::from_bytes(&doc.to_bytes().unwrap()).unwrap();
    assert_eq!(paragraph_texts(&reopened), paragraph_texts(&doc));
    assert_eq!(reopened.body.paragraphs()[1].runs().next().unwrap().format, RunFormat::bold());
}

#[test]
fn test_scan_and_lint_tokens() {
    let mut doc = contract_template();
    doc.push_paragraph(Paragraph::with_text("{{ CLIENT }} e {{ CLIENTE }}"));

    assert_eq!(
        scan_tokens(&doc, Traversal::Body),
        vec!["{{ CLIENTE }}", "{{ VALOR }}", "{{ CPF }}", "{{ MODELO }}", "{{ CLIENT }}"]
    );
    assert_eq!(
        scan_tokens(&doc, Traversal::BodyAndHeaders).last().unwrap(),
        "{{ DATA }}"
    );
    assert_eq!(lint_tokens(DocumentKind::Contract, &doc), vec!["{{ CLIENT }}"]);
}
