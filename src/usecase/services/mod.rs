pub mod cell_format;
pub mod chart_service;
pub mod export_service;
pub mod table_service;
