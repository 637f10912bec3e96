//! Request and response values exchanged with the host router.

pub mod request;
pub mod response;

pub use request::{parse_query_string, HttpRequest, QueryVec, UploadedFile, MAX_INLINE_QUERY};
pub use response::{HeaderVec, HttpResponse, MAX_INLINE_HEADERS};
