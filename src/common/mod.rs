pub use config::*;
pub use result::*;

mod config;
mod result;
