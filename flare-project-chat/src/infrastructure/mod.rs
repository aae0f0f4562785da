pub mod broadcast;
pub mod hooks;
pub mod identity;
pub mod persistence;
pub mod session;
