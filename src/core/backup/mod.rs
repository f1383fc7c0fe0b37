pub mod copy;
pub mod guard;

pub use copy::{copy_dir, copy_dir_recursive};
pub use guard::DataGuard;
