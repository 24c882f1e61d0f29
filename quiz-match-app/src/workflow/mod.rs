pub mod account;
pub mod gameplay;
pub mod room;
