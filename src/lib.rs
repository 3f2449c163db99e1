//! Authoritative backend for room-based team music-trivia battles.
//!
//! Clients connect over a single WebSocket, bind to a room, and play
//! best-of matches of eight mini-game formats. All rule enforcement,
//! timing, and scoring happens here; clients only render state.

pub mod config;
pub mod content;
pub mod dto;
pub mod error;
pub mod game;
pub mod routes;
pub mod services;
pub mod state;
