use crate::model::{Record, SortKey};

/// Table columns, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Organization,
    Director,
    Phone,
    Address,
}

impl Column {
    pub const ALL: [Column; 4] = [
        Column::Organization,
        Column::Director,
        Column::Phone,
        Column::Address,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Column::Organization => "ORGANIZATION",
            Column::Director => "DIRECTOR",
            Column::Phone => "PHONE",
            Column::Address => "ADDRESS",
        }
    }

    pub fn digit(self) -> char {
        match self {
            Column::Organization => '1',
            Column::Director => '2',
            Column::Phone => '3',
            Column::Address => '4',
        }
    }

    pub fn from_digit(digit: char) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.digit() == digit)
    }

    /// Record field the column sorts by. Addresses sort by city.
    pub fn sort_key(self) -> SortKey {
        match self {
            Column::Organization => SortKey::Company,
            Column::Director => SortKey::DirectorFullName,
            Column::Phone => SortKey::Phone,
            Column::Address => SortKey::City,
        }
    }

    pub fn cell(self, record: &Record) -> String {
        match self {
            Column::Organization => record.company.name.clone(),
            Column::Director => record.director_full_name.clone(),
            Column::Phone => record.phone.clone(),
            Column::Address => record.address.display(),
        }
    }

    pub fn width_percent(self) -> u16 {
        match self {
            Column::Organization => 25,
            Column::Director => 25,
            Column::Phone => 20,
            Column::Address => 30,
        }
    }
}
