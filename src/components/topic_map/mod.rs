mod audio;
mod component;
mod controller;
mod layout;
mod projection;
mod render;
mod state;
mod theme;
mod types;


pub use component::TopicMap;
pub use types::{GraphData, GraphDataError};
