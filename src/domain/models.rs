use serde::{Deserialize, Serialize};

/// A saved address, exactly as it is stored in the slot.
///
/// A record whose `id` is `0` has no usable identifier; it is kept in the
/// collection but never listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRecord {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    pub address_name: String,
    pub cep: String,
    pub logradouro: String,
    pub bairro: String,
    pub localidade: String,
    pub uf: String,
}

impl AddressRecord {
    pub fn has_id(&self) -> bool {
        self.id != 0
    }
}

/// The four fields filled in by a postal code lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFields {
    pub logradouro: String,
    pub bairro: String,
    pub localidade: String,
    pub uf: String,
}

/// One input of the address form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    AddressName,
    Cep,
    Logradouro,
    Bairro,
    Localidade,
    Uf,
}

impl Field {
    /// Every field, in form order.
    pub const ALL: [Field; 7] = [
        Field::Name,
        Field::AddressName,
        Field::Cep,
        Field::Logradouro,
        Field::Bairro,
        Field::Localidade,
        Field::Uf,
    ];

    /// Fields the user types into; the rest come from the postal lookup.
    pub const EDITABLE: [Field; 3] = [Field::Name, Field::AddressName, Field::Cep];

    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::AddressName => "Address name",
            Field::Cep => "CEP",
            Field::Logradouro => "Street",
            Field::Bairro => "District",
            Field::Localidade => "City",
            Field::Uf => "State",
        }
    }

    pub fn is_editable(self) -> bool {
        Self::EDITABLE.contains(&self)
    }
}

/// In-progress, unsaved form values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressDraft {
    pub name: String,
    pub address_name: String,
    pub cep: String,
    pub logradouro: String,
    pub bairro: String,
    pub localidade: String,
    pub uf: String,
}

impl AddressDraft {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::AddressName => &self.address_name,
            Field::Cep => &self.cep,
            Field::Logradouro => &self.logradouro,
            Field::Bairro => &self.bairro,
            Field::Localidade => &self.localidade,
            Field::Uf => &self.uf,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::AddressName => &mut self.address_name,
            Field::Cep => &mut self.cep,
            Field::Logradouro => &mut self.logradouro,
            Field::Bairro => &mut self.bairro,
            Field::Localidade => &mut self.localidade,
            Field::Uf => &mut self.uf,
        };
        *slot = value;
    }

    /// Overwrites the derived fields; the user-typed ones are left alone.
    pub fn fill_address(&mut self, fields: AddressFields) {
        self.logradouro = fields.logradouro;
        self.bairro = fields.bairro;
        self.localidade = fields.localidade;
        self.uf = fields.uf;
    }

    /// Fields that are empty once surrounding whitespace is ignored.
    pub fn blank_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| self.get(*field).trim().is_empty())
            .collect()
    }

    pub fn to_record(&self, id: u64) -> AddressRecord {
        AddressRecord {
            id,
            name: self.name.trim().to_string(),
            address_name: self.address_name.trim().to_string(),
            cep: self.cep.trim().to_string(),
            logradouro: self.logradouro.trim().to_string(),
            bairro: self.bairro.trim().to_string(),
            localidade: self.localidade.trim().to_string(),
            uf: self.uf.trim().to_string(),
        }
    }
}

impl From<&AddressRecord> for AddressDraft {
    fn from(record: &AddressRecord) -> Self {
        Self {
            name: record.name.clone(),
            address_name: record.address_name.clone(),
            cep: record.cep.clone(),
            logradouro: record.logradouro.clone(),
            bairro: record.bairro.clone(),
            localidade: record.localidade.clone(),
            uf: record.uf.clone(),
        }
    }
}
