pub mod directive;
pub mod error;
mod paths;
pub mod policy;
pub mod replace;
pub mod store;

pub use directive::{DirectiveError, ReplaceDirective};
pub use error::StoreError;
pub use replace::{ReplaceOutcome, apply};
pub use store::{FileStore, SavePolicy, TRASH_DIR};
