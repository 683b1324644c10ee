use crate::core::FieldId;
use crate::editors::{ControlView, EditorInput, EditorKey, EditorView, FieldEditor};
use crate::fields::FieldValue;

/// Discrete steps from 1 to `max`; 0 means unrated.
/// Hovering previews a step and Enter/Space commits it. Arrow keys change the
/// value immediately.
pub struct RatingEditor {
    field_id: FieldId,
    label: String,
    max: u8,
    hover: Option<u8>,
}

impl RatingEditor {
    pub fn new(field_id: FieldId, label: &str, max: u8) -> Self {
        Self {
            field_id,
            label: label.to_string(),
            max,
            hover: None,
        }
    }

    fn selected(&self, current: Option<&FieldValue>) -> Option<u8> {
        current
            .and_then(FieldValue::as_number)
            .map(|n| n.round().clamp(0.0, self.max as f64) as u8)
    }

    fn emit(&self, step: u8, current: Option<&FieldValue>) -> Option<FieldValue> {
        let step = step.min(self.max);
        if self.selected(current) == Some(step) {
            return None;
        }
        Some(FieldValue::Number(step as f64))
    }
}

impl FieldEditor for RatingEditor {
    fn field_id(&self) -> FieldId {
        self.field_id
    }

    fn render(&self, current: Option<&FieldValue>, disabled: bool, error: Option<&str>) -> EditorView {
        let selected = self.selected(current);
        let preview = if disabled { None } else { self.hover };
        let control = ControlView::Rating {
            max: self.max,
            selected,
            preview,
            filled: preview.or(selected).unwrap_or(0),
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
            self.hover = None;
            return None;
        }
        let selected = self.selected(current).unwrap_or(0);
        match input {
            EditorInput::Hover(step) => {
                self.hover = Some(step.min(self.max));
                None
            }
            EditorInput::HoverEnd => {
                self.hover = None;
                None
            }
            EditorInput::Click(step) => {
                self.hover = None;
                self.emit(step, current)
            }
            EditorInput::Key(EditorKey::Enter | EditorKey::Space) => {
                let step = self.hover.take()?;
                self.emit(step, current)
            }
            EditorInput::Key(EditorKey::ArrowUp | EditorKey::ArrowRight) => {
                self.emit(selected.saturating_add(1), current)
            }
            EditorInput::Key(EditorKey::ArrowDown | EditorKey::ArrowLeft) => {
                self.emit(selected.saturating_sub(1), current)
            }
            _ => None,
        }
    }
}
