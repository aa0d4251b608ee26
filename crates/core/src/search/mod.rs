mod cursor;
mod paginator;

pub use cursor::{CursorError, SearchCursor, CURSOR_VERSION};
pub use paginator::{paginate, SearchPage, SearchRequest, DEFAULT_RESULTS, MAX_RESULTS};
