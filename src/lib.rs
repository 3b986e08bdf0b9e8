pub mod client;
pub mod constants;
pub mod errors;
