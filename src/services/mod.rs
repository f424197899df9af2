pub mod loader;
pub mod migration;
pub mod progress;

pub use loader::{BoardLoader, ColumnCards};
pub use migration::{CardOutcome, MigrationReport, MigrationService, MigrationStep, StepFailure};
pub use progress::{ProgressLevel, ProgressLine, ProgressReporter};
