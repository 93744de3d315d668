pub mod health;
mod pages;
pub mod registration;
pub mod setup;
