pub mod context;
pub mod movie;
pub mod page;

pub use context::ListingContext;
pub use movie::{Movie, MovieId};
pub use page::Page;
