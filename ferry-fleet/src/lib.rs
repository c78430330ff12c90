pub mod locks;
pub mod occupancy;
pub mod registry;

pub use locks::FerryLocks;
pub use occupancy::{Assignment, OccupancyAccountant};
pub use registry::FerryRegistry;
