mod board;
mod dispatcher;
mod handle;

pub use board::TaskBoard;
pub use dispatcher::ProgressDispatcher;
pub use handle::ImportProgressHandle;
