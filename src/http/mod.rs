pub mod client;
pub mod debug;

pub use client::{DebugSink, HttpClient, HttpResponseData};
pub use debug::HttpDebugConfig;
