pub mod prelude;

pub mod flashcards;
pub mod users;
pub mod workspaces;
