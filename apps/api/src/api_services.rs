mod sessions;
mod state_builder;

pub use sessions::build_memory_session_layer;
pub use state_builder::build_app_state;
