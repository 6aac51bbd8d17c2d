pub mod json_photo_catalog;
pub mod process_memory_monitor;
