//! Reading sources, writing bundles and persisting configurations.

pub mod persist;
pub mod reader;
pub mod writer;

pub use persist::{export_config, import_config, load_config_file, save_config_file};
pub use reader::{LoadedSource, ProbedFile, SourceLoader, probe_all, probe_file, probe_page_count};
pub use writer::{PdfWriter, WriteOptions, WriteStatistics};
