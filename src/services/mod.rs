//! Service layer between the transport and the room actors.

pub mod room_service;
pub mod websocket_service;
