mod types;
pub use types::*;
mod flow;
pub use flow::*;
mod handle;
pub use handle::*;
mod table;
pub use table::*;
mod registry;
pub use registry::*;
mod event;
pub use event::*;
mod controller;
pub use controller::*;
mod liveness;
pub use liveness::*;
mod runtime;
pub use runtime::*;
