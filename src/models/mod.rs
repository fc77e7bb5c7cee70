pub mod backend;
pub mod category;
pub mod config;
pub mod preset;
pub mod scan;
pub mod step;
pub mod undo;
