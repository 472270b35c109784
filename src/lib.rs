pub mod api;
pub mod config;
pub mod console;
pub mod db;
pub mod export;
pub mod login;
pub mod models;
pub mod routes;
pub mod session;
pub mod terminal;
pub mod views;
