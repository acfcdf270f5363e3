pub mod logging;
pub mod responses;

pub use logging::LoggingHelper;
pub use responses::ApiError;
