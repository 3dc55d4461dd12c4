pub mod config;
pub mod report;
pub mod scan;

pub use config::{
    resolve, ConfigError, ConfigSource, FileConfig, FileConfigLoader, ScanConfig, ScanOptions,
    ScanOptionsPatch, CONFIG_FILENAME, DEFAULT_CONTEXT, DEFAULT_TIMEOUT_MS,
};
pub use report::{build_report, render_report, AssertionEvent, OutputFormat, RunReport, Verdict};
pub use scan::{
    driver::ScanDriver, raw::RawResults, Impact, PassRecord, RelatedCheck, RelatedNode, ScanEngine,
    ScanOutcome, Violation, ViolationNode,
};
