//! Postal code lookup against the ViaCEP web service.

use crate::domain::{AddressFields, cep_digits, is_valid_cep};
use log::{info, warn};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://viacep.com.br";

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("invalid CEP {0:?}")]
    InvalidCep(String),
    #[error("CEP {0} not found")]
    NotFound(String),
    #[error("lookup service answered with status {0}")]
    Status(u16),
    #[error("incomplete answer from lookup service: missing {0}")]
    Malformed(&'static str),
    #[error("lookup request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Resolves a postal code to the address it identifies.
pub trait PostalLookup: Send + Sync {
    fn lookup(&self, cep: &str) -> Result<AddressFields, LookupError>;
}

pub struct ViaCepClient {
    client: Client,
    base_url: String,
}

impl ViaCepClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, digits: &str) -> String {
        format!("{}/ws/{digits}/json/", self.base_url)
    }
}

impl PostalLookup for ViaCepClient {
    fn lookup(&self, cep: &str) -> Result<AddressFields, LookupError> {
        if !is_valid_cep(cep) {
            return Err(LookupError::InvalidCep(cep.to_string()));
        }
        let digits = cep_digits(cep);
        let url = self.endpoint(&digits);
        info!("looking up CEP {digits}");

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            warn!("CEP lookup for {digits} returned {status}");
            return Err(LookupError::Status(status.as_u16()));
        }
        let body: ViaCepResponse = response.json()?;
        body.into_fields(&digits)
    }
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    logradouro: Option<String>,
    bairro: Option<String>,
    localidade: Option<String>,
    uf: Option<String>,
    #[serde(default)]
    erro: Option<Value>,
}

impl ViaCepResponse {
    fn into_fields(self, digits: &str) -> Result<AddressFields, LookupError> {
        let not_found = match &self.erro {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => flag == "true",
            _ => false,
        };
        if not_found {
            return Err(LookupError::NotFound(digits.to_string()));
        }
        Ok(AddressFields {
            logradouro: self.logradouro.ok_or(LookupError::Malformed("logradouro"))?,
            bairro: self.bairro.ok_or(LookupError::Malformed("bairro"))?,
            localidade: self.localidade.ok_or(LookupError::Malformed("localidade"))?,
            uf: self.uf.ok_or(LookupError::Malformed("uf"))?,
        })
    }
}
