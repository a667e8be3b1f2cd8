// Labor & Social Protection Dashboard - Core Library
// Exposes all modules for use in CLI, TUI, API server, and tests

pub mod cleaning;   // Raw export → cleaned table
pub mod config;     // dashboard.toml
pub mod engine;     // Pure render(table, selection) → ViewModel
pub mod error;
pub mod export;
pub mod logging;
pub mod selection;
pub mod stats;
pub mod table;
pub mod taxonomy;   // Sections, indicators, descriptions

// Re-export commonly used types
pub use cleaning::{CleaningPipeline, CleaningReport, Diagnostic, RawTable, Severity};
pub use config::DashboardConfig;
pub use engine::{
    render, Chart, DetailView, NoDataView, Overview, OverviewPanel, Point, RenderOptions, Series,
    Session, ViewModel,
};
pub use error::{DataError, SelectionError};
pub use export::{export_filename, ExportFile};
pub use selection::{ChartKind, ChartKinds, Mode, Selection, YearRange};
pub use stats::{BoxSummary, SummaryStats};
pub use table::{CleanedRecord, CleanedTable, TableSchema};
pub use taxonomy::{describe, Indicator, Section};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
