#![forbid(unsafe_code)]

mod call_dependencies;
mod checksum;
mod checksum_table;
mod dependencies;
mod error;
mod program;
mod prune;
mod set_of_sets;
mod structural;

pub use call_dependencies::{CallDependencies, DeclDependencies};
pub use checksum::{Checksum, ChecksumCombiner, CombineOrder};
pub use checksum_table::ChecksumTable;
pub use dependencies::{DependencyNode, Polarity};
pub use error::ProgramError;
pub use program::AnalyzedProgram;
pub use prune::{DependencyGraph, Pruner, live_variables, trim_where_assumes};
pub use set_of_sets::SetOfSets;
pub use structural::{assign_structural_checksums, structural_fingerprint};
