pub mod card;
pub mod error;
pub mod space;

pub use card::{
    prepare_properties, Board, Card, CardFile, Checklist, ChecklistItem, Column, Comment,
    CommentAuthor, Created, Lane, MigrationMapping, MigrationTarget, NewCard, Tag,
};
pub use error::MigrationError;
pub use space::{normalize_domain, Space, SpaceForm};
