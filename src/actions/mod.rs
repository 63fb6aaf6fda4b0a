//! File actions on a finished scan.
//!
//! Only deletion is provided: redundant copies are moved to the system trash
//! (default, recoverable) or removed permanently, one file at a time, after
//! the duplicate set is final.
//!
//! ```no_run
//! use dupfind::actions::delete::delete_to_trash;
//! use std::path::Path;
//!
//! let result = delete_to_trash(Path::new("/path/to/duplicate.txt"));
//! ```

pub mod delete;

pub use delete::{
    delete_duplicates, delete_to_trash, delete_verified, permanent_delete, plan_deletions,
    validate_preserves_copy, BatchDeleteResult, DeleteConfig, DeleteError, DeleteResult,
    DeletionPlan,
};
