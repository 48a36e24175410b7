pub mod commands;

// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

pub use commands::command_argument_builder;
pub use handlers::{
    EXIT_FOUND, EXIT_INVALID, EXIT_NOT_FOUND, config_from_matches, expand_path, normalize_page_arg,
};
