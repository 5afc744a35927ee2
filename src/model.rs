pub mod bindings;
pub mod desktop;
pub mod history;
pub mod names;

pub use bindings::{HotkeyBinding, HotkeyBindingTable};
pub use desktop::{Desktop, DesktopId, DesktopNames, NameDelta, PickerEntry};
pub use history::{HistoryError, HistorySummary, NavigationHistory};
pub use names::{NameStore, RonNameStore};
