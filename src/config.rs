//! Compile-time defaults. Runtime overrides come in through CLI flags only.

/// Default directory for CSV output and memory.json.
pub const DEFAULT_DATA_DIR: &str = "out";

/// Items requested per page from the search endpoint.
pub const PAGE_SIZE: usize = 100;

/// Sort order passed to the kernels listing.
pub const SORT_BY: &str = "dateCreated";

/// File name of the search history inside the output directory.
pub const MEMORY_FILE: &str = "memory.json";

/// Base URL of the Kaggle public API.
pub const KAGGLE_API_BASE: &str = "https://www.kaggle.com/api/v1";
