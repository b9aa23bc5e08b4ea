pub mod clipboard;
pub mod demo;
pub mod history;
pub mod input;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod tools;

pub use clipboard::ClipboardData;
pub use history::{DEFAULT_HISTORY_DEPTH, History};
pub use input::{InputEvent, Modifiers};
pub use selection::{Selectable, Selection};
pub use session::EditorSession;
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::{ConnectTool, CutTool, EDGE_DRAG_START_THRESHOLD, Hit, Tool, ToolKind};
