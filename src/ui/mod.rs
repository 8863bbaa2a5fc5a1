// Everything that touches the window:
// - EventLoopBridge gets closures from tokio threads onto the Slint event loop
// - GuiController wires callbacks and the state subscription into MainWindow
// - RfdFileDialogs covers the native file pickers and the help link

pub mod bridge;
pub mod controller;
pub mod dialogs;

pub use bridge::{EventLoopBridge, EventLoopBridgeHandle};
pub use controller::GuiController;
pub use dialogs::{HELP_URL, RfdFileDialogs, open_in_browser};
