mod dialog;
mod footer;
mod header;
mod input;
mod toast;

pub use dialog::{ConfirmDialog, DialogButton, DialogKind, DialogState};
pub use footer::Footer;
pub use header::{Header, VERSION};
pub use input::{InputOutcome, TextInput};
pub use toast::{Toast, ToastLevel, ToastManager};
