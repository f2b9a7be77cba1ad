//! Product schema and validation.

pub mod errors;
pub mod product;
pub mod types;
pub mod validator;

pub use errors::{FieldError, ViolationKind};
pub use types::{FieldDef, FieldType, Format, ObjectSchema};
pub use validator::{ProductValidator, SchemaVariant, ValidationResult};
