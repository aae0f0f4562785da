pub mod memory;
pub mod postgres;

pub use memory::InMemoryChatRepository;
pub use postgres::PostgresChatRepository;
