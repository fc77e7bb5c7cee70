pub mod config_commands;
pub mod file_commands;
pub mod pipeline_commands;
pub mod undo_commands;
