//! HTTP Request domain types

mod header;
mod method;
mod spec;

pub use header::{AUTHORIZATION, Header, Headers};
pub use method::HttpMethod;
pub use spec::{DEFAULT_TIMEOUT_MS, RequestSpec};
