pub mod images;
pub mod repository;

pub use images::Images;
pub use repository::Repository;
