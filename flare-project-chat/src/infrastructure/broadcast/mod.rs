pub mod memory;
pub mod redis;

pub use memory::InProcessRoomBroadcaster;
pub use self::redis::{RedisRoomBroadcaster, RoomPublisher};
