//! Wire-facing data transfer objects and their validation rules.

pub mod room;
pub mod validation;
pub mod ws;
