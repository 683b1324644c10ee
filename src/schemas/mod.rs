// Field schemas - bindings, invariants and tag resolution

pub mod binding_resolver;
pub mod constraints;
pub mod models;
pub mod reorder;

pub use binding_resolver::{resolve_available_fields, AvailableField};
pub use constraints::{
    validate_schema_fields, SchemaViolation, ViolationLocation, ViolationRule, MAX_SHOW_ON_CARD,
};
pub use models::{
    FieldSchema, FieldSchemaUpdate, NewFieldSchema, NewSchemaField, NewTag, ReorderEntry, SchemaField,
    SchemaFieldInput, SchemaFieldUpdate, Tag,
};
pub use reorder::{apply_reorder, BindingMutator, ReorderMode, ReorderReport};
