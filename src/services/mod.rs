pub mod gradebook;
pub mod sessions;
pub mod submissions;
