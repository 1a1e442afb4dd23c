pub mod dvmdb_device;
pub mod system_status;

pub use dvmdb_device::DvmdbDeviceDataSource;
pub use system_status::SystemStatusDataSource;
