//! Content extractors for fetched blog pages.
//!
//! Every extractor is a pure function of the page markup, except the REST
//! probe which needs the network. None of them fail: a technique that does not
//! work on a page simply yields less (or nothing).
//!
//! | Module | Produces | Technique |
//! |--------|----------|-----------|
//! | [`article`] | title + main text | readability cascade with heuristics fallback |
//! | [`comments`] | reader comments | keyword and CSS-selector harvesting, lexical filters |
//! | [`probes`] | extra comments / annotations | WordPress REST API, Disqus and Facebook widget markers |
//! | [`text`] | helpers | tag stripping, whitespace normalization |

pub mod article;
pub mod comments;
pub mod probes;
pub mod text;
