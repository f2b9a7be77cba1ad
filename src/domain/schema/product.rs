//! The product document schema.

use super::types::{FieldDef, FieldType, Format, ObjectSchema};

/// Fields of the optional `specifications` block, in declaration order.
pub const SPECIFICATION_FIELDS: [&str; 7] = [
    "brand",
    "model",
    "camera",
    "battery",
    "storage",
    "colour",
    "modelYear",
];

/// Top-level fields a new product must carry.
pub const REQUIRED_ON_CREATE: [&str; 6] = [
    "title",
    "reviewScore",
    "code",
    "description",
    "imageUrl",
    "tags",
];

fn specifications_schema() -> ObjectSchema {
    let fields = SPECIFICATION_FIELDS
        .iter()
        .map(|name| {
            let field_type = if *name == "modelYear" {
                FieldType::formatted(Format::Date)
            } else {
                FieldType::non_empty_string()
            };
            FieldDef::required(*name, field_type)
        })
        .collect();
    ObjectSchema::new(fields)
}

/// Schema used when a product is created: the strict variant.
pub fn create_schema() -> ObjectSchema {
    let field = |name: &str, field_type: FieldType| {
        if REQUIRED_ON_CREATE.contains(&name) {
            FieldDef::required(name, field_type)
        } else {
            FieldDef::optional(name, field_type)
        }
    };

    ObjectSchema::new(vec![
        field("title", FieldType::non_empty_string()),
        field("code", FieldType::non_empty_string()),
        field("description", FieldType::non_empty_string()),
        field("reviewScore", FieldType::integer_between(1, 5)),
        field("price", FieldType::integer()),
        field("imageUrl", FieldType::formatted(Format::Url)),
        field("tags", FieldType::array_of(FieldType::non_empty_string())),
        field("specifications", FieldType::Object(specifications_schema())),
    ])
}

/// Schema used for partial updates: same constraints, nothing required.
pub fn update_schema() -> ObjectSchema {
    create_schema().relaxed()
}
