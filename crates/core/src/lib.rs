#![forbid(unsafe_code)]

pub mod chapters;
pub mod content;
pub mod model;
pub mod quiz;
pub mod scheduler;
pub mod time;

pub use time::Clock;
