mod diff;
mod dumper;
mod parser;
mod runner;
mod test_case;

pub use diff::{DiffRun, DiffRuns};
pub use dumper::dump;
pub use parser::{FormatError, TestReader};
pub use runner::{Coretest, CoretestBus};
pub use test_case::{Patch, TestCase};

pub type AppResult<T> = anyhow::Result<T>;
