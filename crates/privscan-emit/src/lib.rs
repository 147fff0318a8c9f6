/*! Turn loop classification results into text people can read.
 *
 * The dump lists, per loop, which memory falls in which privatization or dependence category.
 * It is meant for eyeballing a result and for regression baselines; the JSON report carries the
 * same information plus dependence records for tools.
 */

pub mod config;
pub mod dump;
pub mod emitter;
pub mod output;
pub mod report;

pub use config::{DumpConfig, IndentStyle};
pub use dump::TraitDumper;
pub use emitter::{EmitContext, EmitHelper, EmitResult, Emitter};
pub use output::{JsonFormatter, OutputFormat};
pub use report::{FunctionReport, LoopReport, MemoryReport, NodeReport, UnknownReport};
