// Input module - Keyboard and pointer handling

pub mod dispatcher;
pub mod keymap;

pub use dispatcher::{InputDispatcher, RepeatTick};
