pub mod app;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod orders;
pub mod state;
pub mod views;
