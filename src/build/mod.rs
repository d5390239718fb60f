mod batch;
mod command;
mod core;
mod invoke;
mod pool;

pub use batch::{MAX_BATCH, batch_size, plan_batches};
pub use command::CompilerCommand;
pub use core::{BuildContext, BuildSummary, Builder, support_files};
pub use invoke::{Invoker, ProcessInvoker};
pub use pool::JobPool;
