pub mod api_client;
pub mod auth_service;
pub mod directory_service;
pub mod evaluation_service;
pub mod evaluation_session;
pub mod evaluations_panel;
pub mod history_service;
pub mod project_service;
pub mod session_store;
