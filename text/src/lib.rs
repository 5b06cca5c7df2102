//! Text-sync bridge for Ferry.
//!
//! The native consumer draws its own text fields but relies on a hidden platform
//! widget for the soft keyboard and input-method editing. Text flows both ways:
//!
//! - consumer → widget through [`TextInputHandle`], dispatched to the widget thread;
//! - widget → consumer through [`TextEditor`], which reports every user edit as an
//!   `onTextChanged` event and suppresses the echo of programmatic writes.

mod editor;
mod handle;
mod state;
mod widget;

pub use editor::{TextEditor, Visibility};
pub use handle::TextInputHandle;
pub use state::{SyncMode, TextState};
pub use widget::{TextWidget, WidgetChange};
