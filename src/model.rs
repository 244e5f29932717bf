use std::fmt;

use serde::{Deserialize, Serialize};

pub type RecordId = u64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub suite: String,
}

impl Address {
    /// Single-line form used by the table and the CLI printer.
    pub fn display(&self) -> String {
        [&self.city, &self.street, &self.suite]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    #[serde(default)]
    pub name: String,
}

/// One organization entry as served by the API.
///
/// `director_full_name` is the denormalized display name: search runs
/// against it and the table shows it as the primary name. Records fetched
/// without it inherit `name` (see [`Record::with_display_name`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub company: Company,
    #[serde(default)]
    pub director_full_name: String,
}

impl Record {
    /// Blank template used by the create dialog.
    pub fn blank(id: RecordId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn with_display_name(mut self) -> Self {
        if self.director_full_name.is_empty() {
            self.director_full_name = self.name.clone();
        }
        self
    }

    /// Text representation of `key`, used for lexicographic sorting.
    pub fn field_text(&self, key: SortKey) -> String {
        match key {
            SortKey::Id => self.id.to_string(),
            SortKey::Name => self.name.clone(),
            SortKey::Username => self.username.clone(),
            SortKey::Email => self.email.clone(),
            SortKey::Phone => self.phone.clone(),
            SortKey::City => self.address.city.clone(),
            SortKey::Street => self.address.street.clone(),
            SortKey::Suite => self.address.suite.clone(),
            SortKey::Company => self.company.name.clone(),
            SortKey::DirectorFullName => self.director_full_name.clone(),
        }
    }

    pub fn into_new(self) -> NewRecord {
        NewRecord {
            name: self.name,
            username: self.username,
            email: self.email,
            phone: self.phone,
            address: self.address,
            company: self.company,
            director_full_name: self.director_full_name,
        }
    }
}

/// Create payload: a record without its id, which the service assigns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
    pub company: Company,
    pub director_full_name: String,
}

impl NewRecord {
    #[cfg(test)]
    pub fn with_id(self, id: RecordId) -> Record {
        Record {
            id,
            name: self.name,
            username: self.username,
            email: self.email,
            phone: self.phone,
            address: self.address,
            company: self.company,
            director_full_name: self.director_full_name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Id,
    Name,
    Username,
    Email,
    Phone,
    City,
    Street,
    Suite,
    Company,
    DirectorFullName,
}

impl SortKey {
    pub const ALL: [SortKey; 10] = [
        SortKey::Id,
        SortKey::Name,
        SortKey::Username,
        SortKey::Email,
        SortKey::Phone,
        SortKey::City,
        SortKey::Street,
        SortKey::Suite,
        SortKey::Company,
        SortKey::DirectorFullName,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Name => "name",
            SortKey::Username => "username",
            SortKey::Email => "email",
            SortKey::Phone => "phone",
            SortKey::City => "city",
            SortKey::Street => "street",
            SortKey::Suite => "suite",
            SortKey::Company => "company",
            SortKey::DirectorFullName => "director",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        let needle = s.trim().to_ascii_lowercase();
        match needle.as_str() {
            "director_full_name" | "directorfullname" => Some(SortKey::DirectorFullName),
            _ => Self::ALL.into_iter().find(|key| key.as_str() == needle),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}
