use super::models::Field;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("Invalid CEP: {0} (use the format 99999-999)")]
    InvalidCep(String),
    #[error("Fill in every field before saving (missing: {})", field_list(.0))]
    IncompleteDraft(Vec<Field>),
}

fn field_list(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|field| field.label())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type DomainResult<T> = Result<T, DomainError>;
