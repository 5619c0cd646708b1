mod board;
mod collapse;
mod config;
mod engine;
mod ids;
mod model;
mod orchestrator;
mod persist;
mod scheduler;
mod tracker;

pub use crate::board::*;
pub use crate::collapse::*;
pub use crate::config::*;
pub use crate::engine::*;
pub use crate::ids::*;
pub use crate::model::*;
pub use crate::orchestrator::*;
pub use crate::persist::*;
pub use crate::scheduler::*;
pub use crate::tracker::*;
