pub mod capability;
pub mod chromium;
pub mod mock;

pub use capability::{
    BrowserCapability, ClickOptions, ConsoleMessage, ConsoleMessageKind, Locator, WaitMode,
};
pub use chromium::{ChromiumBrowser, ChromiumPage};
