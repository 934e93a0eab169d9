//! ドメインモデル（ids, todo, filter, errors, events）

pub mod errors;
pub mod events;
pub mod filter;
pub mod ids;
pub mod todo;

pub use self::errors::{ErrorKind, StoreError, TodoError};
pub use self::events::TodoEvent;
pub use self::filter::{Direction, Filter, ParseFilterError, ScanQuery};
pub use self::ids::{ParseTodoIdError, TodoId};
pub use self::todo::{NewTodo, OrderAssignment, Todo, TodoPatch, next_order, sort_for_list};
