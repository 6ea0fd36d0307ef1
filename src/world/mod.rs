pub mod config;
mod island;
pub mod space;

pub use config::SpaceConfig;
pub use space::Space;
