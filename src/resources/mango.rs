//! Mango inventory items.

use super::ResourceDef;
use crate::config::{EntitySchema, FieldSpec};

pub const UNITS: [&str; 4] = ["KG", "DOZEN", "PIECE", "BOX"];
pub const SEASONS: [&str; 5] = ["Spring", "Summer", "Autumn", "Winter", "All"];

pub fn definition() -> ResourceDef {
    ResourceDef {
        name: "Mango",
        plural: "Mangoes",
        path_segment: "mango",
        collection: "mangoes",
        schema: EntitySchema::new()
            .field(FieldSpec::text("name").required().trimmed().length(1, 100))
            .field(FieldSpec::text("variety").required().trimmed().length(1, 100))
            .field(FieldSpec::text("unit").required().one_of(UNITS))
            .field(FieldSpec::number("price").required().minimum(0.0))
            .field(FieldSpec::integer("stock").minimum(0.0).default_value(0))
            .field(FieldSpec::text("season").required().one_of(SEASONS))
            .field(FieldSpec::text("origin").trimmed().max_length(100).default_value("Unknown"))
            .field(FieldSpec::text("description").max_length(500))
            .sort_by("name"),
    }
}
