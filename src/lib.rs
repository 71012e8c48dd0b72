pub mod api;
pub mod chat;
pub mod config;
pub mod entities;
pub mod error;
pub mod feed;
pub mod gateway;
pub mod lifecycle;
pub mod poll;
pub mod session;

#[cfg(test)]
mod testutil;
