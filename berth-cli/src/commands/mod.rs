pub mod network;
pub mod service;
pub mod stack;
