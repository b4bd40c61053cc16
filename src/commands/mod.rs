pub mod create;
pub mod delete;
pub mod fetch;
pub mod list;
pub mod verify;

pub use create::CreateOptions;
pub use delete::{DeleteOptions, DeleteSummary, DeleteTarget};
