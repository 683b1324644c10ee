use crate::core::FieldId;
use crate::editors::{ControlView, EditorInput, EditorView, FieldEditor};
use crate::fields::FieldValue;

/// Single-line input, hard-capped at `max_length` characters when set
pub struct TextEditor {
    field_id: FieldId,
    label: String,
    max_length: Option<u32>,
}

impl TextEditor {
    pub fn new(field_id: FieldId, label: &str, max_length: Option<u32>) -> Self {
        Self {
            field_id,
            label: label.to_string(),
            max_length,
        }
    }

    fn cap(&self, input: String) -> String {
        match self.max_length {
            Some(max) if input.chars().count() > max as usize => {
                input.chars().take(max as usize).collect()
            }
            _ => input,
        }
    }
}

impl FieldEditor for TextEditor {
    fn field_id(&self) -> FieldId {
        self.field_id
    }

    fn render(&self, current: Option<&FieldValue>, disabled: bool, error: Option<&str>) -> EditorView {
        let value = current.and_then(FieldValue::as_text).unwrap_or_default().to_string();
        let counter = self
            .max_length
            .map(|max| format!("{}/{}", value.chars().count(), max));
        let control = ControlView::Text {
            value,
            max_length: self.max_length,
            counter,
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
        let EditorInput::Input(text) = input else {
            return None;
        };
        let text = self.cap(text);
        if current.and_then(FieldValue::as_text).unwrap_or_default() == text {
            return None;
        }
        Some(FieldValue::Text(text))
    }
}
