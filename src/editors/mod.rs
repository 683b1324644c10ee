// Field value editors - headless view models, one per field type
//
// An editor renders the current value into an `EditorView` and turns user
// input into a change event. It never writes anything itself; the auto-save
// coordinator receives the events.

pub mod boolean;
pub mod rating;
pub mod select;
pub mod text;

use serde::Serialize;

use crate::core::FieldId;
use crate::fields::{CustomField, FieldConfig, FieldValue};

pub use boolean::BooleanEditor;
pub use rating::RatingEditor;
pub use select::SelectEditor;
pub use text::TextEditor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Enter,
    Space,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

/// Raw user input delivered to an editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorInput {
    /// Pointer over a rating step
    Hover(u8),
    HoverEnd,
    /// Pointer click on a rating step
    Click(u8),
    Key(EditorKey),
    /// Option picked from a dropdown
    Choose(String),
    /// Full contents of a text input after a keystroke or paste
    Input(String),
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlView {
    Rating {
        max: u8,
        selected: Option<u8>,
        preview: Option<u8>,
        /// Steps drawn filled: the preview while hovering, else the selection
        filled: u8,
    },
    Select {
        options: Vec<String>,
        selected: Option<String>,
    },
    Text {
        value: String,
        max_length: Option<u32>,
        counter: Option<String>,
    },
    Checkbox {
        checked: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorView {
    pub field_id: FieldId,
    pub label: String,
    pub control: ControlView,
    pub disabled: bool,
    pub invalid: bool,
    pub error: Option<String>,
}

impl EditorView {
    fn new(field_id: FieldId, label: &str, control: ControlView, disabled: bool, error: Option<&str>) -> Self {
        Self {
            field_id,
            label: label.to_string(),
            control,
            disabled,
            invalid: error.is_some(),
            error: error.map(str::to_string),
        }
    }
}

/// Shared contract of the four editors.
///
/// `handle` returns the change event for an input, or `None` when the input
/// changes nothing. Disabled editors never emit.
pub trait FieldEditor: Send {
    fn field_id(&self) -> FieldId;

    fn render(&self, current: Option<&FieldValue>, disabled: bool, error: Option<&str>) -> EditorView;

    fn handle(
        &mut self,
        input: EditorInput,
        current: Option<&FieldValue>,
        disabled: bool,
    ) -> Option<FieldValue>;
}

pub fn editor_for(field: &CustomField) -> Box<dyn FieldEditor> {
    match &field.config {
        FieldConfig::Select { options } => {
            Box::new(SelectEditor::new(field.id, &field.name, options.clone()))
        }
        FieldConfig::Rating { max_rating } => {
            Box::new(RatingEditor::new(field.id, &field.name, *max_rating))
        }
        FieldConfig::Text { max_length } => {
            Box::new(TextEditor::new(field.id, &field.name, *max_length))
        }
        FieldConfig::Boolean {} => Box::new(BooleanEditor::new(field.id, &field.name)),
    }
}
