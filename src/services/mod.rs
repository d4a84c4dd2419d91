pub mod optimizer;
pub mod session;

pub use optimizer::{measure_size, optimize, truncate, QualityResult, DEFAULT_QUALITY, QUALITY_LEVELS};
pub use session::{Artifact, Session, SessionStore, StagedFile};
