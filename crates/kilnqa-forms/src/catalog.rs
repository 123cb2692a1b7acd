//! The application's data-entry forms.
//!
//! Each function renders one form the way its page template does: same field
//! names, control types, `required` attributes and defaults. Data-entry forms
//! declare a draft key; the login form and the navbar search do not.
//! [`page`] assembles the full document for a route.

use crate::document::Document;
use crate::field::Field;
use crate::form::{FormBuilder, FormHandle};
use crate::input::InputType;

fn submit_button(label: &str) -> Field {
    Field::new("submit", InputType::Submit).initial(label)
}

/// The navbar search present on every page.
pub fn search_form() -> FormHandle {
    FormBuilder::new("navbar-search")
        .method("get")
        .action("/search")
        .field(Field::new("q", InputType::Text))
        .build()
}

/// `/login`.
pub fn login_form() -> FormHandle {
    FormBuilder::new("login-form")
        .action("/login")
        .field(Field::new("username", InputType::Text).required(true))
        .field(Field::new("password", InputType::Password).required(true))
        .field(submit_button("Log in"))
        .build()
}

/// `/production/create`.
pub fn production_batch_form() -> FormHandle {
    FormBuilder::new("production-form")
        .action("/production/create")
        .draft_key("production_create")
        .field(Field::new("product_type", InputType::Select).required(true))
        .field(Field::new("planned_quantity", InputType::Number).required(true))
        .field(Field::new("production_date", InputType::Date).required(true))
        .field(Field::new("kiln_number", InputType::Select).required(true))
        .field(Field::new("kiln_temperature", InputType::Number))
        .field(Field::new("firing_duration", InputType::Number))
        .field(Field::new("notes", InputType::Textarea))
        .field(submit_button("Create batch"))
        .build()
}

/// The status panel on `/production/<id>`.
pub fn batch_status_form(batch_id: u64, status: &str) -> FormHandle {
    FormBuilder::new("status-form")
        .action(format!("/production/{batch_id}/update_status"))
        .field(Field::new("batch_id", InputType::Hidden).initial(batch_id.to_string()))
        .field(
            Field::new("status", InputType::Select)
                .required(true)
                .initial(status),
        )
        .field(Field::new("actual_quantity", InputType::Number))
        .field(submit_button("Update"))
        .build()
}

/// `/quality/create`.
pub fn quality_test_form() -> FormHandle {
    FormBuilder::new("quality-form")
        .action("/quality/create")
        .draft_key("quality_create")
        .field(Field::new("batch_id", InputType::Select).required(true))
        .field(Field::new("test_type", InputType::Select).required(true))
        .field(Field::new("iso_standard", InputType::Select).initial("ISO 13006"))
        .field(Field::new("length", InputType::Number))
        .field(Field::new("width", InputType::Number))
        .field(Field::new("thickness", InputType::Number))
        .field(Field::new("warping", InputType::Number))
        .field(Field::new("water_absorption", InputType::Number))
        .field(Field::new("breaking_strength", InputType::Number))
        .field(Field::new("abrasion_resistance", InputType::Select))
        .field(Field::new("visual_defects", InputType::Textarea))
        .field(Field::new("compliance_score", InputType::Number))
        .field(Field::new("result", InputType::Select).required(true))
        .field(Field::new("notes", InputType::Textarea))
        .field(submit_button("Record test"))
        .build()
}

/// `/energy/add`.
pub fn energy_form() -> FormHandle {
    FormBuilder::new("energy-form")
        .action("/energy/add")
        .draft_key("energy_add")
        .field(Field::new("date", InputType::Date).required(true))
        .field(Field::new("energy_source", InputType::Select).required(true))
        .field(Field::new("consumption_kwh", InputType::Number).required(true))
        .field(Field::new("cost", InputType::Number))
        .field(Field::new("kiln_number", InputType::Select))
        .field(Field::new("efficiency_rating", InputType::Number))
        .field(Field::new("heat_recovery_kwh", InputType::Number).initial("0"))
        .field(Field::new("notes", InputType::Textarea))
        .field(submit_button("Save"))
        .build()
}

/// `/waste/add`.
pub fn waste_form() -> FormHandle {
    FormBuilder::new("waste-form")
        .action("/waste/add")
        .draft_key("waste_add")
        .field(Field::new("date", InputType::Date).required(true))
        .field(Field::new("waste_type", InputType::Select).required(true))
        .field(Field::new("category", InputType::Text).required(true))
        .field(Field::new("quantity_kg", InputType::Number).required(true))
        .field(Field::new("disposal_method", InputType::Select).required(true))
        .field(Field::new("recycling_percentage", InputType::Number).initial("0"))
        .field(Field::new("environmental_impact", InputType::Textarea))
        .field(Field::new("notes", InputType::Textarea))
        .field(submit_button("Save"))
        .build()
}

/// `/materials/add`.
pub fn raw_material_form() -> FormHandle {
    FormBuilder::new("material-form")
        .action("/materials/add")
        .draft_key("materials_add")
        .field(Field::new("name", InputType::Text).required(true))
        .field(Field::new("supplier", InputType::Text).required(true))
        .field(Field::new("category", InputType::Select).required(true))
        .field(Field::new("quantity_kg", InputType::Number).required(true))
        .field(Field::new("unit_cost", InputType::Number))
        .field(Field::new("quality_grade", InputType::Select))
        .field(Field::new("date_received", InputType::Date).required(true))
        .field(Field::new("expiry_date", InputType::Date))
        .field(Field::new("lot_number", InputType::Text))
        .field(Field::new("specifications", InputType::Textarea))
        .field(Field::new("quality_certified", InputType::Checkbox))
        .field(submit_button("Save"))
        .build()
}

/// Renders the document for a route, or `None` for pages without forms
/// handled here.
pub fn page(path: &str) -> Option<Document> {
    let form = match path {
        "/login" => return Some(Document::new(path).with_form(login_form())),
        "/production/create" => production_batch_form(),
        "/quality/create" => quality_test_form(),
        "/energy/add" => energy_form(),
        "/waste/add" => waste_form(),
        "/materials/add" => raw_material_form(),
        _ => return None,
    };
    Some(Document::new(path).with_form(search_form()).with_form(form))
}
