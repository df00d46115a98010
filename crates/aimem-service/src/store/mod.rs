//! Document store implementations

mod http;

pub use http::HttpDocumentStore;
