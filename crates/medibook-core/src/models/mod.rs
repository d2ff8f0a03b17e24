//! Domain models for the medibook system.

mod appointment;
mod doctor;
mod identity;
mod notification;
mod slot;

pub use appointment::*;
pub use doctor::*;
pub use identity::*;
pub use notification::*;
pub use slot::*;
