pub mod auth;
pub mod flashcards;
pub mod health;
pub mod workspaces;
