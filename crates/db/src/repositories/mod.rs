pub mod quote;

pub use quote::SqlQuoteStore;
