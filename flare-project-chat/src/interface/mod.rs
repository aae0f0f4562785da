pub mod http;

pub use http::{HttpState, router};
