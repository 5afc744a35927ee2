pub mod command;
pub mod hotkey;
pub mod space;
