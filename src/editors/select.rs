use crate::core::FieldId;
use crate::editors::{ControlView, EditorInput, EditorView, FieldEditor};
use crate::fields::FieldValue;

/// Dropdown over the configured options; no free text
pub struct SelectEditor {
    field_id: FieldId,
    label: String,
    options: Vec<String>,
}

impl SelectEditor {
    pub fn new(field_id: FieldId, label: &str, options: Vec<String>) -> Self {
        Self {
            field_id,
            label: label.to_string(),
            options,
        }
    }
}

impl FieldEditor for SelectEditor {
    fn field_id(&self) -> FieldId {
        self.field_id
    }

    fn render(&self, current: Option<&FieldValue>, disabled: bool, error: Option<&str>) -> EditorView {
        let selected = current
            .and_then(FieldValue::as_text)
            .filter(|value| self.options.iter().any(|o| o == value))
            .map(str::to_string);
        let control = ControlView::Select {
            options: self.options.clone(),
            selected,
        };
        EditorView::new(self.field_id, &self.label, control, disabled, error)
    }

    fn handle(
        &mut self,
        input: EditorInput,
        current: Option<&FieldValue>,
        disabled: bool,
    ) -> Option<FieldValue> {
        if disabled {
            return None;
        }
        match input {
            EditorInput::Choose(option) if self.options.contains(&option) => {
                if current.and_then(FieldValue::as_text) == Some(option.as_str()) {
                    None
                } else {
                    Some(FieldValue::Text(option))
                }
            }
            _ => None,
        }
    }
}
