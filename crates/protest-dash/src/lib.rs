pub mod cli;
pub mod commands;
pub mod format;
pub mod logging;
pub mod render;
