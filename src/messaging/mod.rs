pub mod channel;
pub mod protocol;

pub use channel::{request_channel, Envelope, RequestSender};
pub use protocol::{BackgroundRequest, BackgroundResponse, ContentRequest, ContentResponse};
