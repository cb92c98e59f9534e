pub mod collect;
pub mod config_handler;
pub mod flatten;
