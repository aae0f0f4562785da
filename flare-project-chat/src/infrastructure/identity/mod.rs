pub mod http;
pub mod memory;

pub use self::http::HttpIdentityResolver;
pub use memory::StaticIdentityResolver;
