use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, FixedOffset};
use clap::{Args, ValueEnum};
use docx_core::Document;
use proposta::{
    ContractRequest, DocumentGenerator, GeneratedDocument, ImageUpload, OfficeConverter,
    ProposalRequest, ProposalStore, Settings, SqliteProposalStore,
};
use pt_text::{format_brl, format_pt_number, MonetaryAmount, PtFormatter};
use std::fs;
use std::path::{Path, PathBuf};
use template::{lint_tokens, scan_tokens, DocumentKind};

/// Fields shared by proposals and contracts
#[derive(Args, Debug)]
pub struct FormArgs {
    /// JSON file with the request fields; flags override its values
    #[arg(short, long)]
    pub request: Option<PathBuf>,

    #[arg(long)]
    pub cliente: Option<String>,

    /// CPF or CNPJ
    #[arg(long)]
    pub cpf: Option<String>,

    #[arg(long)]
    pub modelo: Option<String>,

    /// Copy quota
    #[arg(long)]
    pub franquia: Option<String>,

    /// Monthly amount, e.g. "1.234,50"
    #[arg(long)]
    pub valor: Option<String>,

    /// Document date (DD/MM/YYYY); defaults to today
    #[arg(long)]
    pub data: Option<String>,

    /// PNG or JPEG placed at {{ IMAGEM }}
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Where to write the PDF; defaults to the generated file name
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ProposalArgs {
    #[command(flatten)]
    pub form: FormArgs,
}

#[derive(Args, Debug)]
pub struct ContractArgs {
    #[command(flatten)]
    pub form: FormArgs,

    #[arg(long)]
    pub endereco: Option<String>,

    /// Rental start date (DD/MM/YYYY)
    #[arg(long)]
    pub data_inicio: Option<String>,

    /// Term in months
    #[arg(long)]
    pub prazo_meses: Option<u32>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Maximum number of entries
    #[arg(short, long, default_value = "20")]
    pub limit: u32,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    pub id: i64,

    /// Destination file
    #[arg(short, long)]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub id: i64,
}

#[derive(Args, Debug)]
pub struct PurgeArgs {
    /// Remove documents older than this many days
    #[arg(short, long)]
    pub days: Option<u32>,
}

#[derive(Args, Debug)]
pub struct WordsArgs {
    #[arg(allow_hyphen_values = true)]
    pub number: i64,
}

#[derive(Args, Debug)]
pub struct ValorArgs {
    /// Amount such as "R$ 1.234,50" or "1234.50"
    pub amount: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum KindArg {
    Proposal,
    Contract,
}

impl From<KindArg> for DocumentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Proposal => DocumentKind::Proposal,
            KindArg::Contract => DocumentKind::Contract,
        }
    }
}

#[derive(Args, Debug)]
pub struct TokensArgs {
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Template file; defaults to the one in the templates directory
    #[arg(short, long)]
    pub template: Option<PathBuf>,
}

pub fn proposal(args: ProposalArgs, settings: &Settings) -> Result<()> {
    let mut request: ProposalRequest = match args.form.request {
        Some(ref path) => read_json(path)?,
        None => ProposalRequest::default(),
    };
    apply_form(&mut request, &args.form)?;

    let generated = generator(settings)?.generate_proposal(request)?;
    write_output(&generated, args.form.out.as_deref())
}

pub fn contract(args: ContractArgs, settings: &Settings) -> Result<()> {
    let mut request: ContractRequest = match args.form.request {
        Some(ref path) => read_json(path)?,
        None => ContractRequest::default(),
    };
    apply_form(&mut request.proposal, &args.form)?;
    if let Some(endereco) = args.endereco {
        request.endereco = endereco;
    }
    if let Some(data_inicio) = args.data_inicio {
        request.data_inicio = data_inicio;
    }
    if let Some(prazo) = args.prazo_meses {
        request.prazo_meses = prazo;
    }

    let generated = generator(settings)?.generate_contract(request)?;
    write_output(&generated, args.form.out.as_deref())
}

pub fn list(args: ListArgs, settings: &Settings) -> Result<()> {
    let entries = open_store(settings)?.list(args.limit)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("Nenhum documento salvo.");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{:>5}  {}  {:<8}  {:<30}  {:<18}  R$ {:>12}  {}",
            entry.id,
            format_timestamp(entry.created_at),
            entry.kind.label(),
            entry.client_name,
            entry.tax_id,
            format_brl(&MonetaryAmount::from_centavos(entry.amount_centavos)),
            entry.filename
        );
    }
    Ok(())
}

pub fn get(args: GetArgs, settings: &Settings) -> Result<()> {
    let document = open_store(settings)?
        .get_document(args.id)?
        .ok_or_else(|| anyhow!("document #{} not found", args.id))?;
    fs::write(&args.out, &document)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    println!("{} ({} bytes)", args.out.display(), document.len());
    Ok(())
}

pub fn delete(args: DeleteArgs, settings: &Settings) -> Result<()> {
    if !open_store(settings)?.delete(args.id)? {
        bail!("document #{} not found", args.id);
    }
    println!("Documento #{} removido.", args.id);
    Ok(())
}

pub fn purge(args: PurgeArgs, settings: &Settings) -> Result<()> {
    let days = args.days.unwrap_or(settings.purge_days);
    let removed = open_store(settings)?.purge_older_than(days)?;
    println!("{removed} documento(s) com mais de {days} dias removido(s).");
    Ok(())
}

pub fn words(args: WordsArgs) -> Result<()> {
    println!("{}", format_pt_number(args.number)?);
    Ok(())
}

pub fn valor(args: ValorArgs) -> Result<()> {
    println!("{}", PtFormatter::format_amount_full(&args.amount)?);
    Ok(())
}

pub fn tokens(args: TokensArgs, settings: &Settings) -> Result<()> {
    let kind = DocumentKind::from(args.kind);
    let path = args
        .template
        .unwrap_or_else(|| settings.templates_dir.join(kind.template_file()));
    let doc =
        Document::open(&path).with_context(|| format!("failed to open {}", path.display()))?;

    let unknown = lint_tokens(kind, &doc);
    for token in scan_tokens(&doc, kind.traversal()) {
        let marker = if unknown.contains(&token) { "?" } else { " " };
        println!("{marker} {token}");
    }
    if !unknown.is_empty() {
        println!("\n{} token(s) não reconhecido(s).", unknown.len());
    }
    Ok(())
}

fn apply_form(request: &mut ProposalRequest, form: &FormArgs) -> Result<()> {
    let overrides = [
        (&mut request.cliente, &form.cliente),
        (&mut request.cpf, &form.cpf),
        (&mut request.modelo, &form.modelo),
        (&mut request.franquia, &form.franquia),
        (&mut request.valor, &form.valor),
    ];
    for (field, value) in overrides {
        if let Some(value) = value {
            field.clone_from(value);
        }
    }
    if form.data.is_some() {
        request.data.clone_from(&form.data);
    }
    if let Some(ref path) = form.image {
        let upload = ImageUpload::from_path(path)
            .with_context(|| format!("failed to read image {}", path.display()))?;
        request.imagem = Some(upload);
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid request in {}", path.display()))
}

fn open_store(settings: &Settings) -> Result<SqliteProposalStore> {
    SqliteProposalStore::open(&settings.database)
        .with_context(|| format!("failed to open {}", settings.database.display()))
}

fn generator(settings: &Settings) -> Result<DocumentGenerator<OfficeConverter, SqliteProposalStore>> {
    let converter = OfficeConverter::new(settings.converter.clone(), settings.convert_timeout);
    Ok(
        DocumentGenerator::new(settings.templates_dir.clone(), converter, open_store(settings)?)
            .with_image_max_width(settings.image_max_width),
    )
}

fn write_output(generated: &GeneratedDocument, out: Option<&Path>) -> Result<()> {
    let path = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&generated.filename));
    fs::write(&path, &generated.pdf)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "{} #{} salvo em {} ({} bytes)",
        generated.kind,
        generated.id,
        path.display(),
        generated.pdf.len()
    );
    Ok(())
}

/// São Paulo wall-clock time for an epoch-millisecond timestamp
fn format_timestamp(millis: i64) -> String {
    let offset = FixedOffset::west_opt(3 * 3600);
    match (DateTime::from_timestamp_millis(millis), offset) {
        (Some(utc), Some(offset)) => utc.with_timezone(&offset).format("%d/%m/%Y %H:%M").to_string(),
        _ => millis.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        // 2026-02-20 15:30 UTC
        assert_eq!(format_timestamp(1_771_601_400_000), "20/02/2026 12:30");
    }

    #[test]
    fn test_apply_form_overrides() {
        let mut request = ProposalRequest {
            cliente: "Ana".to_string(),
            valor: "10,00".to_string(),
            ..Default::default()
        };
        let form = FormArgs {
            request: None,
            cliente: Some("Maria Silva".to_string()),
            cpf: None,
            modelo: Some("MP 301".to_string()),
            franquia: None,
            valor: None,
            data: Some("20/02/2026".to_string()),
            image: None,
            out: None,
        };
        apply_form(&mut request, &form).unwrap();
        assert_eq!(request.cliente, "Maria Silva");
        assert_eq!(request.modelo, "MP 301");
        assert_eq!(request.valor, "10,00");
        assert_eq!(request.data.as_deref(), Some("20/02/2026"));
    }
}
