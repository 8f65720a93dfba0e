pub mod request;
pub mod snippet;

pub use request::SearchRequest;
pub use snippet::Snippet;
