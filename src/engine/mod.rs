pub mod failure;
pub mod lifecycle;
pub mod service;
