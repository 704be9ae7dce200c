mod batch;
mod cursor;
mod interface;
mod mutex;
mod registry;

pub use batch::*;
pub use cursor::ScopeCursor;
pub use interface::*;
pub use mutex::*;
pub(crate) use mutex::acquire;
