pub mod gateway;
pub mod history;
pub mod notifications;
pub mod tracker;
