//! The storage node: a per-entity water budget advanced one step at a time
//! by an external driver.

pub use self::error::{StorageError, StorageResult};
pub use self::node::{NodeState, StorageNode};
pub use self::summary::BudgetSnapshot;

mod error;
mod node;
mod summary;
