//! Raw generation requests and their validated form

use crate::validation::{
    validate_amount, validate_date, validate_image, validate_quota, validate_required,
    validate_tax_id, validate_term, ValidationErrors,
};
use pt_text::{today_sao_paulo, CalendarDate, MonetaryAmount};
use serde::Deserialize;
use std::path::Path;

/// Image chosen by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Original file name, used for the type check
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read an image from disk
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { filename, bytes })
    }
}

/// Proposal form fields, as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProposalRequest {
    pub cliente: String,
    /// CPF or CNPJ
    pub cpf: String,
    pub modelo: String,
    pub franquia: String,
    pub valor: String,
    /// Document date; today in São Paulo when absent
    #[serde(default)]
    pub data: Option<String>,
    #[serde(skip)]
    pub imagem: Option<ImageUpload>,
}

/// Contract form fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContractRequest {
    #[serde(flatten)]
    pub proposal: ProposalRequest,
    pub endereco: String,
    pub data_inicio: String,
    pub prazo_meses: u32,
}

/// A proposal request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProposal {
    pub date: CalendarDate,
    pub cliente: String,
    pub tax_id: String,
    pub modelo: String,
    pub franquia: u64,
    pub valor: MonetaryAmount,
    pub imagem: Option<ImageUpload>,
}

/// A contract request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidContract {
    pub proposal: ValidProposal,
    pub endereco: String,
    pub data_inicio: CalendarDate,
    pub prazo_meses: u32,
}

impl ProposalRequest {
    pub fn validate(self) -> Result<ValidProposal, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let valid = self.check(&mut errors);
        match valid {
            Some(valid) if errors.is_empty() => Ok(valid),
            _ => Err(errors),
        }
    }

    fn check(self, errors: &mut ValidationErrors) -> Option<ValidProposal> {
        validate_required(&self.cliente, "cliente", "Cliente", errors);
        validate_tax_id(&self.cpf, "cpf", errors);
        validate_required(&self.modelo, "modelo", "Modelo", errors);
        let franquia = validate_quota(&self.franquia, "franquia", errors);
        let valor = validate_amount(&self.valor, "valor", errors);
        let date = match self.data.as_deref() {
            Some(data) if !data.trim().is_empty() => validate_date(data, "data", "Data", errors),
            _ => Some(today_sao_paulo()),
        };
        if let Some(ref image) = self.imagem {
            validate_image(&image.filename, &image.bytes, "imagem", errors);
        }

        Some(ValidProposal {
            date: date?,
            cliente: self.cliente.trim().to_string(),
            tax_id: self.cpf.trim().to_string(),
            modelo: self.modelo.trim().to_string(),
            franquia: franquia?,
            valor: valor?,
            imagem: self.imagem,
        })
    }
}

impl ContractRequest {
    pub fn validate(self) -> Result<ValidContract, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let proposal = self.proposal.check(&mut errors);
        validate_required(&self.endereco, "endereco", "Endereço", &mut errors);
        let data_inicio = validate_date(&self.data_inicio, "data_inicio", "Data de início", &mut errors);
        validate_term(self.prazo_meses, "prazo_meses", &mut errors);

        match (proposal, data_inicio) {
            (Some(proposal), Some(data_inicio)) if errors.is_empty() => Ok(ValidContract {
                proposal,
                endereco: self.endereco.trim().to_string(),
                data_inicio,
                prazo_meses: self.prazo_meses,
            }),
            _ => Err(errors),
        }
    }
}
