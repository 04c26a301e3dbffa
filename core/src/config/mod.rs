//! Configuration is split into:
//! - `types.rs` (data structures + defaults)
//! - `load.rs`  (IO: file lookup + env overrides)

mod load;
mod types;

pub use load::{apply_env_overrides, load, CONFIG_FILE_NAME};
pub use types::*;
