pub mod base;
pub mod compare;
pub mod derived;
pub mod display;
pub mod modifier;
pub mod types;
