pub mod device_store;
pub mod pool;

pub use device_store::DeviceStore;
pub use pool::create_database;
