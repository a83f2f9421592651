//! Output generation: chart images and report files.
//!
//! # Submodules
//!
//! - [`charts`]: Word cloud and sentiment pie chart, written as SVG
//! - [`json`]: Writes a `BlogReport` to a JSON file
//! - [`markdown`]: Renders a `BlogReport` as a Markdown page
//!
//! # Output Structure
//!
//! ```text
//! static_dir/
//! └── img/
//!     ├── wordcloud.svg
//!     └── plot.svg
//!
//! report_dir/
//! ├── example-com-post.json
//! └── example-com-post.md
//! ```

pub mod charts;
pub mod json;
pub mod markdown;
