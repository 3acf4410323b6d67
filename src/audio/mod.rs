// Audio module - Processing graph, engine lifecycle and output sinks

pub mod device;
pub mod dsp_utils;
pub mod engine;
pub mod export;
pub mod format_conversion;
pub mod mixer;
pub mod offline;
pub mod parameters;
