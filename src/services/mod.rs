pub mod relay;
pub mod reply;
pub mod transcript;
