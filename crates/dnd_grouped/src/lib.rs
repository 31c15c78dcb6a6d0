mod list;
mod sink;
mod tracker;

pub use crate::list::*;
pub use crate::sink::*;
