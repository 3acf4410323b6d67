// Messaging - Control thread to audio thread hand-off

pub mod channels;
pub mod command;
