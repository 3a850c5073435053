//! Orders placed against mango stock.

use super::ResourceDef;
use crate::config::{EntitySchema, FieldSpec};

pub const STATUSES: [&str; 5] = ["pending", "confirmed", "shipped", "delivered", "cancelled"];

pub fn definition() -> ResourceDef {
    ResourceDef {
        name: "Order",
        plural: "Orders",
        path_segment: "orders",
        collection: "orders",
        schema: EntitySchema::new()
            .field(FieldSpec::text("customer").required().trimmed().length(1, 200))
            .field(FieldSpec::text("mango_id").required().format("uuid"))
            .field(FieldSpec::integer("quantity").required().minimum(1.0).maximum(10_000.0))
            .field(FieldSpec::number("unit_price").required().minimum(0.0))
            .field(FieldSpec::text("status").one_of(STATUSES).default_value("pending"))
            .field(FieldSpec::text("notes").max_length(1000)),
    }
}
