//! Typed field sets for the supported document kinds

use crate::engine::{PlaceholderMap, Traversal, TOKEN_CLOSE, TOKEN_OPEN};
use crate::Result;
use pt_text::{
    format_brl_full, format_grouped, format_months, format_pt_date_long, format_tax_id,
    CalendarDate, MonetaryAmount,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A recognized template key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldKey {
    Data,
    Cliente,
    Cpf,
    Modelo,
    Franquia,
    Valor,
    Imagem,
    Endereco,
    DataInicio,
    Prazo,
}

impl FieldKey {
    /// Key name as written in templates
    pub fn name(&self) -> &'static str {
        match self {
            FieldKey::Data => "DATA",
            FieldKey::Cliente => "CLIENTE",
            FieldKey::Cpf => "CPF",
            FieldKey::Modelo => "MODELO",
            FieldKey::Franquia => "FRANQUIA",
            FieldKey::Valor => "VALOR",
            FieldKey::Imagem => "IMAGEM",
            FieldKey::Endereco => "ENDERECO",
            FieldKey::DataInicio => "DATA_INICIO",
            FieldKey::Prazo => "PRAZO",
        }
    }

    /// Literal token, e.g. `{{ CLIENTE }}`
    pub fn token(&self) -> String {
        format!("{TOKEN_OPEN} {} {TOKEN_CLOSE}", self.name())
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const PROPOSAL_KEYS: &[FieldKey] = &[
    FieldKey::Data,
    FieldKey::Cliente,
    FieldKey::Cpf,
    FieldKey::Modelo,
    FieldKey::Franquia,
    FieldKey::Valor,
    FieldKey::Imagem,
];

const CONTRACT_KEYS: &[FieldKey] = &[
    FieldKey::Data,
    FieldKey::Cliente,
    FieldKey::Cpf,
    FieldKey::Endereco,
    FieldKey::Modelo,
    FieldKey::Franquia,
    FieldKey::Valor,
    FieldKey::DataInicio,
    FieldKey::Prazo,
    FieldKey::Imagem,
];

/// Kind of generated document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Proposal,
    Contract,
}

impl DocumentKind {
    /// Keys a template of this kind may use
    pub fn keys(&self) -> &'static [FieldKey] {
        match self {
            DocumentKind::Proposal => PROPOSAL_KEYS,
            DocumentKind::Contract => CONTRACT_KEYS,
        }
    }

    /// Template file name inside the templates directory
    pub fn template_file(&self) -> &'static str {
        match self {
            DocumentKind::Proposal => "proposta.docx",
            DocumentKind::Contract => "contrato.docx",
        }
    }

    /// Contracts carry tokens in headers and footers too
    pub fn traversal(&self) -> Traversal {
        match self {
            DocumentKind::Proposal => Traversal::Body,
            DocumentKind::Contract => Traversal::BodyAndHeaders,
        }
    }

    /// Key marking where the image goes
    pub fn image_key(&self) -> FieldKey {
        FieldKey::Imagem
    }

    /// Portuguese label used in file names
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Proposal => "proposta",
            DocumentKind::Contract => "contrato",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Formatted values for a rental proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalFields {
    pub data: String,
    pub cliente: String,
    pub cpf: String,
    pub modelo: String,
    pub franquia: String,
    pub valor: String,
}

impl ProposalFields {
    /// Format raw values the way documents show them
    pub fn format(
        date: &CalendarDate,
        cliente: &str,
        tax_id: &str,
        modelo: &str,
        franquia: u64,
        valor: &MonetaryAmount,
    ) -> Result<Self> {
        Ok(Self {
            data: format_pt_date_long(date),
            cliente: cliente.trim().to_string(),
            cpf: format_tax_id(tax_id)?,
            modelo: modelo.trim().to_string(),
            franquia: format_grouped(franquia),
            valor: format_brl_full(valor)?,
        })
    }

    pub fn to_map(&self) -> PlaceholderMap {
        let mut map = PlaceholderMap::new();
        map.insert(FieldKey::Data.token(), self.data.as_str());
        map.insert(FieldKey::Cliente.token(), self.cliente.as_str());
        map.insert(FieldKey::Cpf.token(), self.cpf.as_str());
        map.insert(FieldKey::Modelo.token(), self.modelo.as_str());
        map.insert(FieldKey::Franquia.token(), self.franquia.as_str());
        map.insert(FieldKey::Valor.token(), self.valor.as_str());
        map
    }
}

/// Formatted values for a rental contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractFields {
    #[serde(flatten)]
    pub proposal: ProposalFields,
    pub endereco: String,
    pub data_inicio: String,
    pub prazo: String,
}

impl ContractFields {
    /// Extend proposal fields with the contract terms
    pub fn format(
        proposal: ProposalFields,
        endereco: &str,
        data_inicio: &CalendarDate,
        prazo_meses: u32,
    ) -> Result<Self> {
        Ok(Self {
            proposal,
            endereco: endereco.trim().to_string(),
            data_inicio: format_pt_date_long(data_inicio),
            prazo: format_months(prazo_meses)?,
        })
    }

    pub fn to_map(&self) -> PlaceholderMap {
        let mut map = self.proposal.to_map();
        map.insert(FieldKey::Endereco.token(), self.endereco.as_str());
        map.insert(FieldKey::DataInicio.token(), self.data_inicio.as_str());
        map.insert(FieldKey::Prazo.token(), self.prazo.as_str());
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn proposal() -> ProposalFields {
        ProposalFields {
            data: "20 de fevereiro de 2026".to_string(),
            cliente: "Maria Silva".to_string(),
            cpf: "123.456.789-01".to_string(),
            modelo: "MP 301".to_string(),
            franquia: "5.000".to_string(),
            valor: "R$ 1.234,50 (mil duzentos e trinta e quatro reais)".to_string(),
        }
    }

    #[test]
    fn test_format_proposal() {
        let fields = ProposalFields::format(
            &CalendarDate::new(2026, 2, 20).unwrap(),
            " Maria Silva ",
            "12345678901",
            "MP 301",
            5000,
            &"1234,50".parse::<MonetaryAmount>().unwrap(),
        )
        .unwrap();
        assert_eq!(fields, proposal());
    }

    #[test]
    fn test_format_rejects_bad_tax_id() {
        let err = ProposalFields::format(
            &CalendarDate::new(2026, 2, 20).unwrap(),
            "Maria",
            "123",
            "MP 301",
            0,
            &MonetaryAmount::from_centavos(100),
        )
        .unwrap_err();
        assert!(matches!(err, crate::TemplateError::Text(_)));
    }

    #[test]
    fn test_format_contract() {
        let fields = ContractFields::format(
            proposal(),
            "Rua A, 10",
            &CalendarDate::new(2026, 3, 1).unwrap(),
            12,
        )
        .unwrap();
        assert_eq!(fields.data_inicio, "1 de março de 2026");
        assert_eq!(fields.prazo, "12 (doze) meses");
    }

    #[test]
    fn test_tokens() {
        assert_eq!(FieldKey::Cliente.token(), "{{ CLIENTE }}");
        assert_eq!(FieldKey::DataInicio.token(), "{{ DATA_INICIO }}");
    }

    #[test]
    fn test_keys_are_not_substrings_of_each_other() {
        let tokens: Vec<String> = CONTRACT_KEYS.iter().map(FieldKey::token).collect();
        for a in &tokens {
            for b in &tokens {
                if a != b {
                    assert!(!a.contains(b.as_str()), "{a} contains {b}");
                }
            }
        }
    }

    #[test]
    fn test_proposal_map() {
        let map = proposal().to_map();
        assert_eq!(map.len(), 6);
        assert_eq!(map.get("{{ CLIENTE }}"), Some("Maria Silva"));
        assert_eq!(map.get("{{ IMAGEM }}"), None);
    }

    #[test]
    fn test_contract_map_and_serde() {
        let fields = ContractFields {
            proposal: proposal(),
            endereco: "Rua A, 10".to_string(),
            data_inicio: "1 de março de 2026".to_string(),
            prazo: "12 (doze) meses".to_string(),
        };
        let map = fields.to_map();
        assert_eq!(map.len(), 9);
        assert_eq!(map.get("{{ PRAZO }}"), Some("12 (doze) meses"));

        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["cliente"], "Maria Silva");
        assert_eq!(json["data_inicio"], "1 de março de 2026");
        let back: ContractFields = serde_json::from_value(json).unwrap();
        assert_eq!(back, fields);
    }

    #[test]
    fn test_document_kind() {
        assert_eq!(DocumentKind::Proposal.traversal(), Traversal::Body);
        assert_eq!(DocumentKind::Contract.traversal(), Traversal::BodyAndHeaders);
        assert!(DocumentKind::Contract.keys().contains(&FieldKey::Prazo));
        assert!(!DocumentKind::Proposal.keys().contains(&FieldKey::Prazo));
        assert_eq!(DocumentKind::Contract.to_string(), "contrato");
        assert_eq!(
            serde_json::to_string(&DocumentKind::Proposal).unwrap(),
            "\"proposal\""
        );
    }
}
