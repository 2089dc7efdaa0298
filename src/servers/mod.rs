pub mod catalog;
pub mod list;
