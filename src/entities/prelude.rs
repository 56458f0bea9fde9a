pub use super::flashcards::Entity as Flashcards;
pub use super::users::Entity as Users;
pub use super::workspaces::Entity as Workspaces;
