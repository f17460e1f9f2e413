pub mod lectures;

pub mod uploads;

pub use lectures::configure_lecture_routes;
pub use uploads::configure_upload_routes;
