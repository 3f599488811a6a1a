//! Domain models for the pharmacy ledger

mod adjustment;
mod inbound;
mod medicine;
mod movement;
mod party;
mod returns;
mod sale;
mod user;

pub use adjustment::*;
pub use inbound::*;
pub use medicine::*;
pub use movement::*;
pub use party::*;
pub use returns::*;
pub use sale::*;
pub use user::*;
