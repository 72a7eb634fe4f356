pub mod chat_api;
pub mod gui;
pub mod layout;
pub mod scroll;
pub mod store;
pub mod theme;
