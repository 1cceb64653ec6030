//! Infrastructure adapters

mod reqwest_client;
mod tracing_notifier;

pub use reqwest_client::ReqwestHttpClient;
pub use tracing_notifier::TracingNotifier;
