pub mod authentication;
pub mod notification;
