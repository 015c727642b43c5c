pub mod conversation;
pub mod geofence;
pub mod schedule;
pub mod state;
pub mod summary;
