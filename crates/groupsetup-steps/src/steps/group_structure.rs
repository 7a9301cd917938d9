//! Group Structure: classes, locations, departments and contacts

use super::{is_blank, load_typed, new_id, to_payload};
use groupsetup_core::{CoreError, StepModule, StepPayload};
use serde::{Deserialize, Serialize};

const STEP: &str = "group_structure";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeClass {
    pub class_id: String,
    pub name: String,
    pub full_time_hours: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupStructureData {
    pub classes: Vec<EmployeeClass>,
    pub locations: Vec<Location>,
    pub departments: Vec<Department>,
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Default)]
pub struct GroupStructureStep {
    data: GroupStructureData,
    touched: bool,
}

impl GroupStructureStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, name: &str, full_time_hours: Option<u32>) -> String {
        let class_id = new_id();
        self.data.classes.push(EmployeeClass {
            class_id: class_id.clone(),
            name: name.to_string(),
            full_time_hours,
        });
        class_id
    }

    pub fn add_location(&mut self, name: &str, city: &str, state: &str, zip: &str) -> String {
        let id = new_id();
        self.data.locations.push(Location {
            id: id.clone(),
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            zip: zip.to_string(),
        });
        id
    }

    pub fn add_department(&mut self, name: &str, code: &str) -> String {
        let id = new_id();
        self.data.departments.push(Department {
            id: id.clone(),
            name: name.to_string(),
            code: code.to_string(),
        });
        id
    }

    pub fn add_contact(&mut self, first_name: &str, last_name: &str, email: &str, roles: &[&str]) -> String {
        let id = new_id();
        self.data.contacts.push(Contact {
            id: id.clone(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        });
        id
    }

    pub fn data(&self) -> &GroupStructureData {
        &self.data
    }

    /// Whether inline errors are being shown
    pub fn is_touched(&self) -> bool {
        self.touched
    }
}

impl StepModule for GroupStructureStep {
    fn get_data(&self) -> StepPayload {
        to_payload(STEP, &self.data)
    }

    fn load(&mut self, payload: &StepPayload) -> Result<(), CoreError> {
        self.data = load_typed(STEP, payload)?;
        Ok(())
    }

    fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    fn validation_errors(&self) -> Vec<String> {
        let d = &self.data;
        let mut errors = Vec::new();

        if d.classes.is_empty() {
            errors.push("At least one employee class is required".to_string());
        }
        let unnamed = d.classes.iter().filter(|c| is_blank(&c.name)).count();
        if unnamed > 0 {
            errors.push(format!("{} class(es) need a name", unnamed));
        }
        if d.locations.is_empty() {
            errors.push("At least one location is required".to_string());
        }
        if d.contacts.is_empty() {
            errors.push("At least one contact is required".to_string());
        }
        let missing_email: Vec<String> = d
            .contacts
            .iter()
            .filter(|c| !c.email.contains('@'))
            .map(|c| format!("{} {}", c.first_name, c.last_name).trim().to_string())
            .collect();
        if !missing_email.is_empty() {
            errors.push(format!(
                "Contacts need a valid email (missing: {})",
                missing_email.join(", ")
            ));
        }

        errors
    }

    fn mark_forms_as_touched(&mut self) {
        self.touched = true;
    }
}
