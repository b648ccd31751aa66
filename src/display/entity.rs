//! Entity display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::audit::format_value;
use crate::models::{EntityRecord, EntityType};

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Version")]
    version: u64,
    #[tabled(rename = "Updated")]
    updated: String,
    #[tabled(rename = "Fields")]
    fields: String,
}

/// Format records of one type as a table
pub fn format_entity_list(entity_type: EntityType, records: &[EntityRecord]) -> String {
    if records.is_empty() {
        return format!("No {} records found.", entity_type);
    }

    let rows: Vec<EntityRow> = records
        .iter()
        .map(|record| EntityRow {
            id: record.id.clone(),
            version: record.version,
            updated: record.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            fields: record.fields.keys().cloned().collect::<Vec<_>>().join(", "),
        })
        .collect();

    Table::new(rows).with(Style::psql()).to_string()
}

/// Format one record with every field
pub fn format_entity_details(entity_type: EntityType, record: &EntityRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}: {}\n", entity_type, record.id));
    output.push_str(&format!("  Version:  {}\n", record.version));
    output.push_str(&format!(
        "  Created:  {}\n",
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!(
        "  Updated:  {}\n",
        record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if !record.fields.is_empty() {
        output.push('\n');
        for (field, value) in &record.fields {
            output.push_str(&format!("  {}: {}\n", field, format_value(value)));
        }
    }

    output
}
