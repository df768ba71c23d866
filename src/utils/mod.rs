pub mod fs;
pub mod log_once;
pub mod timer;
