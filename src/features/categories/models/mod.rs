mod category;

pub use category::{
    Category, CategoryChanges, CategoryFilter, CategoryPath, CategoryTree, DeleteOutcome,
    MoveValidation, NewCategory, Reparent,
};
