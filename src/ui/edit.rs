use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::model::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Company,
    Director,
    Phone,
    City,
    Street,
    Suite,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::Company,
        FormField::Director,
        FormField::Phone,
        FormField::City,
        FormField::Street,
        FormField::Suite,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Company => "Organization",
            FormField::Director => "Director",
            FormField::Phone => "Phone",
            FormField::City => "City",
            FormField::Street => "Street",
            FormField::Suite => "Building",
        }
    }

    fn index(self) -> usize {
        match self {
            FormField::Company => 0,
            FormField::Director => 1,
            FormField::Phone => 2,
            FormField::City => 3,
            FormField::Street => 4,
            FormField::Suite => 5,
        }
    }

    fn read(self, record: &Record) -> &str {
        match self {
            FormField::Company => &record.company.name,
            FormField::Director => &record.director_full_name,
            FormField::Phone => &record.phone,
            FormField::City => &record.address.city,
            FormField::Street => &record.address.street,
            FormField::Suite => &record.address.suite,
        }
    }
}

/// Inputs of the add/edit dialog, seeded from the store's draft.
#[derive(Default)]
pub struct DialogForm {
    inputs: [Input; 6],
    focus: usize,
}

impl DialogForm {
    pub fn from_record(record: &Record) -> Self {
        Self {
            inputs: FormField::ALL.map(|field| Input::new(field.read(record).to_string())),
            focus: 0,
        }
    }

    pub fn focused(&self) -> FormField {
        FormField::ALL[self.focus]
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % FormField::ALL.len();
    }

    pub fn focus_prev(&mut self) {
        if self.focus == 0 {
            self.focus = FormField::ALL.len() - 1;
        } else {
            self.focus -= 1;
        }
    }

    pub fn value(&self, field: FormField) -> &str {
        self.inputs[field.index()].value()
    }

    pub fn visual_cursor(&self) -> usize {
        self.inputs[self.focus].visual_cursor()
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        self.inputs[self.focus].handle_event(&Event::Key(key)).is_some()
    }

    /// Fields left blank; every field is required.
    pub fn missing(&self) -> Vec<FormField> {
        FormField::ALL
            .into_iter()
            .filter(|field| self.value(*field).trim().is_empty())
            .collect()
    }

    /// Fold the inputs into `draft`.
    ///
    /// The director input is both the display name and the record name;
    /// handle and email are not editable here and stay as drafted.
    pub fn apply_to(&self, draft: &Record) -> Record {
        let director = self.value(FormField::Director).trim().to_string();
        let mut record = draft.clone();
        record.company.name = self.value(FormField::Company).trim().to_string();
        record.name = director.clone();
        record.director_full_name = director;
        record.phone = self.value(FormField::Phone).trim().to_string();
        record.address.city = self.value(FormField::City).trim().to_string();
        record.address.street = self.value(FormField::Street).trim().to_string();
        record.address.suite = self.value(FormField::Suite).trim().to_string();
        record
    }
}
