use super::ResourceDef;
use crate::config::{EntitySchema, FieldSpec};

pub const ROLES: [&str; 3] = ["customer", "staff", "admin"];

pub fn definition() -> ResourceDef {
    ResourceDef {
        name: "User",
        plural: "Users",
        path_segment: "users",
        collection: "users",
        schema: EntitySchema::new()
            .field(FieldSpec::text("name").required().trimmed().length(1, 100))
            .field(FieldSpec::text("email").required().trimmed().lowercase().format("email").max_length(254))
            .field(FieldSpec::text("role").one_of(ROLES).default_value("customer"))
            .field(FieldSpec::boolean("active").default_value(true))
            .sort_by("email"),
    }
}
