pub mod actions;
pub mod commands;
pub mod connection;
pub mod device;
pub mod output;
pub mod registers;
pub mod status;
