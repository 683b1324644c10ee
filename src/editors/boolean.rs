use crate::core::FieldId;
use crate::editors::{ControlView, EditorInput, EditorView, FieldEditor};
use crate::fields::FieldValue;

/// Checkbox labelled with the field name.
/// An unset value shows unchecked but is only written once toggled.
pub struct BooleanEditor {
    field_id: FieldId,
    label: String,
}

impl BooleanEditor {
    pub fn new(field_id: FieldId, label: &str) -> Self {
        Self {
            field_id,
            label: label.to_string(),
        }
    }
}

impl FieldEditor for BooleanEditor {
    fn field_id(&self) -> FieldId {
        self.field_id
    }

    fn render(&self, current: Option<&FieldValue>, disabled: bool, error: Option<&str>) -> EditorView {
        let checked = current.and_then(FieldValue::as_bool).unwrap_or(false);
        EditorView::new(
            self.field_id,
            &self.label,
            ControlView::Checkbox { checked },
            disabled,
            error,
        )
    }

    fn handle(
        &mut self,
        input: EditorInput,
        current: Option<&FieldValue>,
        disabled: bool,
    ) -> Option<FieldValue> {
        if disabled || input != EditorInput::Toggle {
            return None;
        }
        let checked = current.and_then(FieldValue::as_bool).unwrap_or(false);
        Some(FieldValue::Boolean(!checked))
    }
}
