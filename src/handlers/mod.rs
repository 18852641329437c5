pub mod auth;
pub mod catalog;
pub mod health;
pub mod journal;
pub mod responses;
pub mod sleep;
