pub mod interfaces;
pub mod status_page;

pub use interfaces::config;
