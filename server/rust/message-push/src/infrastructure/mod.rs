pub mod config;
pub mod delivery;
pub mod identity;
pub mod template_store;
