pub mod catalog;
pub mod classroom_store;
pub mod constants;
pub mod engine;
pub mod layout;
pub mod playback;
pub mod rng;
pub mod server_protocol;
pub mod server_utils;
pub mod types;
