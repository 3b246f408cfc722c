//! Generation pipeline: validate, fill the template, convert, persist

use crate::converter::DocumentConverter;
use crate::request::{ContractRequest, ImageUpload, ProposalRequest};
use crate::store::{NewProposal, ProposalStore};
use crate::{GeneratorError, Result};
use docx_core::{Document, Length};
use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use template::{
    fill, lint_tokens, place_image, ContractFields, DocumentKind, ImageSource, PlaceholderMap,
    ProposalFields, TemplateError,
};

/// Formatted values that went into the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DocumentFields {
    Proposal(ProposalFields),
    Contract(ContractFields),
}

/// Result of a successful generation
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    /// Store record id
    pub id: i64,
    pub kind: DocumentKind,
    pub filename: String,
    pub pdf: Vec<u8>,
    pub fields: DocumentFields,
}

/// Everything `render` needs besides the template itself
struct Job {
    kind: DocumentKind,
    map: PlaceholderMap,
    image: Option<ImageUpload>,
    record: NewProposal,
}

/// Produces proposal and contract PDFs from the templates directory
pub struct DocumentGenerator<C, S> {
    templates_dir: PathBuf,
    image_max_width: Length,
    converter: C,
    store: S,
}

impl<C: DocumentConverter, S: ProposalStore> DocumentGenerator<C, S> {
    pub fn new(templates_dir: impl Into<PathBuf>, converter: C, store: S) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            image_max_width: Length::from_mm(150.0),
            converter,
            store,
        }
    }

    /// Widest an inserted image may be
    pub fn with_image_max_width(mut self, max_width: Length) -> Self {
        self.image_max_width = max_width;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    pub fn template_path(&self, kind: DocumentKind) -> PathBuf {
        self.templates_dir.join(kind.template_file())
    }

    pub fn generate_proposal(&self, request: ProposalRequest) -> Result<GeneratedDocument> {
        let valid = request.validate().map_err(GeneratorError::Validation)?;
        let fields = ProposalFields::format(
            &valid.date,
            &valid.cliente,
            &valid.tax_id,
            &valid.modelo,
            valid.franquia,
            &valid.valor,
        )?;

        let job = Job {
            kind: DocumentKind::Proposal,
            map: fields.to_map(),
            image: valid.imagem,
            record: NewProposal {
                kind: DocumentKind::Proposal,
                client_name: fields.cliente.clone(),
                tax_id: fields.cpf.clone(),
                product_model: fields.modelo.clone(),
                quota: valid.franquia,
                amount_centavos: valid.valor.centavos(),
                filename: String::new(),
                document: Vec::new(),
            },
        };
        self.render(job, DocumentFields::Proposal(fields))
    }

    pub fn generate_contract(&self, request: ContractRequest) -> Result<GeneratedDocument> {
        let valid = request.validate().map_err(GeneratorError::Validation)?;
        let proposal = valid.proposal;
        let fields = ContractFields::format(
            ProposalFields::format(
                &proposal.date,
                &proposal.cliente,
                &proposal.tax_id,
                &proposal.modelo,
                proposal.franquia,
                &proposal.valor,
            )?,
            &valid.endereco,
            &valid.data_inicio,
            valid.prazo_meses,
        )?;

        let job = Job {
            kind: DocumentKind::Contract,
            map: fields.to_map(),
            image: proposal.imagem,
            record: NewProposal {
                kind: DocumentKind::Contract,
                client_name: fields.proposal.cliente.clone(),
                tax_id: fields.proposal.cpf.clone(),
                product_model: fields.proposal.modelo.clone(),
                quota: proposal.franquia,
                amount_centavos: proposal.valor.centavos(),
                filename: String::new(),
                document: Vec::new(),
            },
        };
        self.render(job, DocumentFields::Contract(fields))
    }

    fn render(&self, job: Job, fields: DocumentFields) -> Result<GeneratedDocument> {
        let Job {
            kind,
            map,
            image,
            mut record,
        } = job;

        let template_path = self.template_path(kind);
        if !template_path.is_file() {
            return Err(GeneratorError::TemplateMissing(template_path));
        }
        let mut doc = Document::open(&template_path).map_err(TemplateError::from)?;

        let unknown = lint_tokens(kind, &doc);
        if !unknown.is_empty() {
            warn!(
                "{} has unrecognized tokens: {}",
                template_path.display(),
                unknown.join(", ")
            );
        }

        let traversal = kind.traversal();
        let rewritten = fill(&mut doc, &map, traversal);
        debug!("{kind}: {rewritten} paragraphs filled");

        let image_token = kind.image_key().token();
        let source = image.map(|upload| ImageSource::Bytes(upload.bytes));
        if !place_image(&mut doc, &image_token, source, self.image_max_width, traversal)? {
            debug!("{kind}: template has no {image_token}");
        }

        let stem = format!(
            "{}-{}",
            kind.label(),
            sanitize_filename(&record.client_name, "cliente")
        );
        let pdf = {
            let temp_dir = tempfile::tempdir().map_err(GeneratorError::TempDir)?;
            let docx_path = temp_dir.path().join(format!("{stem}.docx"));
            doc.save(&docx_path).map_err(TemplateError::from)?;
            self.convert(&docx_path)?
        };

        record.filename = format!("{stem}.pdf");
        record.document = pdf;
        let id = self.store.save(&record)?;
        info!(
            "generated {kind} #{id} for {} ({} bytes)",
            record.client_name,
            record.document.len()
        );

        Ok(GeneratedDocument {
            id,
            kind,
            filename: record.filename,
            pdf: record.document,
            fields,
        })
    }

    fn convert(&self, docx_path: &Path) -> Result<Vec<u8>> {
        let pdf_path = self.converter.convert(docx_path).map_err(|err| {
            warn!("conversion of {} failed: {err}", docx_path.display());
            GeneratorError::ConversionFailed(err)
        })?;
        Ok(fs::read(pdf_path)?)
    }
}

/// Lowercase ASCII slug for file names; accents are folded
pub fn sanitize_filename(name: &str, fallback: &str) -> String {
    let mut result = String::new();
    let mut last_dash = false;

    for ch in name.trim().chars().map(fold_accent) {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !last_dash && !result.is_empty()
        {
            result.push('-');
            last_dash = true;
        }
    }

    let result = result.trim_matches('-');
    if result.is_empty() {
        fallback.to_string()
    } else {
        result.to_string()
    }
}

fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        other => other,
    }
}
