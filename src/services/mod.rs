pub mod chat;
pub mod commission;
pub mod finance;
pub mod format;
pub mod goals;
pub mod inventory;
pub mod loyalty;
pub mod validation;
