pub mod detail;
pub mod search;
pub mod sources;

// Re-export command functions for convenience
pub use detail::detail;
pub use search::{search, SearchArgs};
pub use sources::sources;
