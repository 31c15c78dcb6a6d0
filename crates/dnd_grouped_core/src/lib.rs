mod autoscroll;
mod cache;
mod collision;
mod config;
mod error;
mod geometry;
mod gesture;
mod model;
mod ordering;
mod store;
mod sync;
mod virtual_list;

pub use crate::autoscroll::*;
pub use crate::cache::*;
pub use crate::collision::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::geometry::*;
pub use crate::gesture::*;
pub use crate::model::*;
pub use crate::ordering::*;
pub use crate::store::*;
pub use crate::sync::*;
pub use crate::virtual_list::*;
