pub mod cluster;
pub mod codec;
pub mod config;
pub mod demos;
pub mod error;
pub mod fixtures;
pub mod imgproc;
pub mod linalg;
pub mod logging;
pub mod plot;
pub mod video;

pub use config::DemoConfig;
pub use demos::{Demo, DemoContext, DemoReport};
pub use error::{FunsetError, Result};
