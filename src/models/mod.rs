mod post;
mod summary;

pub use post::*;
pub use summary::*;
