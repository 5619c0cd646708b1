pub mod floor_plan;
pub mod menu;
mod support;
mod toolbar;

pub use support::{init_tracing, load_board, load_config, save_status_label};
