pub mod cloudinary;
pub mod local;
pub mod r#trait;

pub use cloudinary::CloudinaryStorage;
pub use local::LocalStorage;
pub use r#trait::{StorageBackend, StorageError};
