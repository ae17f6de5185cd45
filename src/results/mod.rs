pub mod aggregator;
pub mod record;
pub mod writer;

pub use aggregator::{AccumulationPolicy, ModuleGroup, ResultAggregator, ResultStore};
pub use record::{RecordKind, ResultRecord};
pub use writer::OutputWriter;
