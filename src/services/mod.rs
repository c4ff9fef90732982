// Business logic layer
pub mod catalog;
