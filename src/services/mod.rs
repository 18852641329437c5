pub mod intake;
pub mod journal_feed;
