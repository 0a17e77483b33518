//! Run status documents and their storage.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteStatusStore;
pub use store::{StatusError, StatusFilter, StatusStore};
pub use types::{
    now_secs, ChildStatus, FetchStatus, NotifyStatus, StatusDocument, CHILD_IMPORT_TYPE,
    UNSET_FUNCTION_INDEX,
};
