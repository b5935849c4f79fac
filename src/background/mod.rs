pub mod capture;
pub mod controller;
pub mod relay;
pub mod service;
mod worker;

pub use capture::{CaptureService, FileCapturer, ScreenCapturer};
pub use controller::BackgroundController;
pub use relay::{RelayClient, RelayReply};
pub use service::{BackgroundService, Command};
