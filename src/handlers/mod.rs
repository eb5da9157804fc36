pub mod cash_flow;
pub mod category;
pub mod chat;
pub mod commission;
pub mod customer;
pub mod expense;
pub mod goal;
pub mod lead;
pub mod product;
pub mod redemption;
pub mod report;
pub mod revenue;
pub mod sale;
pub mod seller;
pub mod supplier;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;
