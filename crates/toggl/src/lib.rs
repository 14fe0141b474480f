pub mod client;

pub use client::{TogglClient, TogglSettings, DEFAULT_BASE_URL};
