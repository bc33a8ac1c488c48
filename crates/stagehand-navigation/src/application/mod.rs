//! Navigation application services.

pub mod animator;
pub mod command_handlers;
pub mod query_handlers;
pub mod scene_manager;
