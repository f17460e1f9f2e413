pub mod context;
pub mod labels;
pub mod pagination;
pub mod response;

pub use context::RequestContext;
pub use pagination::PaginationInfo;
pub use response::ApiResponse;
