pub mod backend_client;
pub mod consolidation_service;
pub mod execution_service;
pub mod override_service;
pub mod persistence_service;
pub mod pipeline_service;
pub mod preset_service;
pub mod scan_service;
pub mod undo_service;
