pub mod content;
pub mod finalizer;
pub mod players;
pub mod scheduler;
pub mod standings;

pub use content::{ContentClient, ContentSource};
pub use finalizer::finalize_standings;
pub use scheduler::FixtureScheduler;
pub use standings::StandingsEngine;
