//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod achievement;
pub mod custom_question;
pub mod folder;
pub mod item;
pub mod review;

// Re-export specific types to avoid conflicts
pub use achievement::{
    Column as AchievementColumn, Entity as Achievement, Model as AchievementModel,
};
pub use custom_question::{
    Column as CustomQuestionColumn, Entity as CustomQuestion, Model as CustomQuestionModel,
};
pub use folder::{Column as FolderColumn, Entity as Folder, Model as FolderModel};
pub use item::{Column as ItemColumn, Entity as Item, Model as ItemModel};
pub use review::{Column as ReviewColumn, Entity as Review, Model as ReviewModel};
