mod model;
mod provider;

pub use model::*;
pub use provider::GeminiProvider;
