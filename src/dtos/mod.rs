pub mod catalog;
pub mod chat;
pub mod commission;
pub mod finance;
pub mod goal;
pub mod lead;
pub mod party;
pub mod product;
pub mod redemption;
pub mod report;
pub mod sale;
pub mod user;
