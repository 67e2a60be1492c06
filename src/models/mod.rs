pub mod job;
pub mod loaders;
pub mod outcome;
pub mod step;

pub use job::{Fingerprint, JobRecord, PortalKind};
pub use loaders::{load_jobs, save_jobs};
pub use outcome::{ApplicationOutcome, BatchAbort, BatchReport};
pub use step::StepState;
