pub mod annotate;
pub mod model;
pub mod store;

pub use annotate::MetadataEditor;
pub use model::{BookmarkNode, CreateBookmark, MoveDestination, CLOSED_FOLDER_NAME, SESSION_FOLDER_NAME};
pub use store::BookmarkStore;
