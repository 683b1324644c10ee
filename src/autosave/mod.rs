// Auto-save - optimistic editing of field values with debounced persistence

pub mod coordinator;
pub mod save_state;

pub use coordinator::{AutoSaveCoordinator, ValueSink};
pub use save_state::{EditableValue, SaveState};
