//! Schema building blocks: field types, format checks and object schemas.

use chrono::NaiveDate;

/// String formats understood by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Absolute URL with a host.
    Url,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Url => "url",
            Format::Date => "date",
        }
    }

    pub fn matches(&self, s: &str) -> bool {
        match self {
            Format::Url => url::Url::parse(s).map(|u| u.has_host()).unwrap_or(false),
            Format::Date => s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
        }
    }
}

/// Declared type of a field, with its constraints.
#[derive(Debug, Clone)]
pub enum FieldType {
    String {
        min_length: Option<usize>,
        format: Option<Format>,
    },
    Integer {
        minimum: Option<i64>,
        maximum: Option<i64>,
    },
    Array(Box<FieldType>),
    Object(ObjectSchema),
}

impl FieldType {
    pub fn non_empty_string() -> Self {
        FieldType::String {
            min_length: Some(1),
            format: None,
        }
    }

    pub fn formatted(format: Format) -> Self {
        FieldType::String {
            min_length: None,
            format: Some(format),
        }
    }

    pub fn integer() -> Self {
        FieldType::Integer {
            minimum: None,
            maximum: None,
        }
    }

    pub fn integer_between(minimum: i64, maximum: i64) -> Self {
        FieldType::Integer {
            minimum: Some(minimum),
            maximum: Some(maximum),
        }
    }

    pub fn array_of(items: FieldType) -> Self {
        FieldType::Array(Box::new(items))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String { .. } => "string",
            FieldType::Integer { .. } => "integer",
            FieldType::Array(_) => "array",
            FieldType::Object(_) => "object",
        }
    }

    fn relaxed(&self) -> Self {
        match self {
            FieldType::Array(items) => FieldType::Array(Box::new(items.relaxed())),
            FieldType::Object(schema) => FieldType::Object(schema.relaxed()),
            other => other.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
}

impl FieldDef {
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
        }
    }
}

/// An open object schema: declared fields are checked, undeclared ones pass through.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    pub fields: Vec<FieldDef>,
}

impl ObjectSchema {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self { fields }
    }

    /// Copy of this schema with every `required` flag cleared, recursively.
    /// Type and format constraints are kept.
    pub fn relaxed(&self) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .map(|f| FieldDef {
                    name: f.name.clone(),
                    field_type: f.field_type.relaxed(),
                    required: false,
                })
                .collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_format() {
        assert!(Format::Url.matches("https://x.test/a.png"));
        assert!(Format::Url.matches("http://localhost:8080/img?id=1"));
        assert!(!Format::Url.matches("not-a-url"));
        assert!(!Format::Url.matches("/relative/path.png"));
        assert!(!Format::Url.matches(""));
    }

    #[test]
    fn test_date_format() {
        assert!(Format::Date.matches("2023-09-12"));
        assert!(Format::Date.matches("2024-02-29"));
        assert!(!Format::Date.matches("2023-02-30"));
        assert!(!Format::Date.matches("2023-9-1"));
        assert!(!Format::Date.matches("12/09/2023"));
    }

    #[test]
    fn test_relaxed_clears_nested_required() {
        let schema = ObjectSchema::new(vec![
            FieldDef::required("title", FieldType::non_empty_string()),
            FieldDef::optional(
                "specifications",
                FieldType::Object(ObjectSchema::new(vec![FieldDef::required(
                    "brand",
                    FieldType::non_empty_string(),
                )])),
            ),
        ]);
        let relaxed = schema.relaxed();
        assert!(!relaxed.field("title").unwrap().required);
        match &relaxed.field("specifications").unwrap().field_type {
            FieldType::Object(inner) => assert!(!inner.field("brand").unwrap().required),
            other => panic!("unexpected type {:?}", other),
        }
    }
}
