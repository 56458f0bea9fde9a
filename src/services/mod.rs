pub mod flashcard_service;
pub mod scope;
pub mod workspace_service;
