pub mod anthropic;
pub mod cohere;
pub mod google;
pub mod mistral;
mod mix;
pub mod openai;
pub mod registry;
pub mod server;

pub use mix::*;
