pub mod arbiter;
pub mod state;
