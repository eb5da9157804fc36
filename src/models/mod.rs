pub mod catalog;
pub mod commission;
pub mod finance;
pub mod goal;
pub mod lead;
pub mod loyalty;
pub mod party;
pub mod product;
pub mod sale;
pub mod user;
