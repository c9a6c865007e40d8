mod control_service;
mod room_lock;

pub use control_service::*;
pub use room_lock::*;
