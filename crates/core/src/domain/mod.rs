pub mod action;
pub mod quote;
