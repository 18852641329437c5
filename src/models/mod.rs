pub mod catalog;
pub mod journal;
pub mod response;
pub mod sleep;
pub mod user;
