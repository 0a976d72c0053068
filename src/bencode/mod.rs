pub use decimal::{read_decimal, write_decimal};
pub use encoder::*;
pub use parser::*;
pub use value::*;
use token::*;

use super::common::*;

pub mod de;
mod decimal;
mod encoder;
mod parser;
pub mod ser;
mod token;
mod value;
