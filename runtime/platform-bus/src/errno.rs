//! Kernel errno values used by the platform seams
//!
//! Kernel entry points report failure as the negated value.

pub const ENOENT: i32 = 2;
pub const EIO: i32 = 5;
pub const ENXIO: i32 = 6;
pub const ENOMEM: i32 = 12;
pub const EBUSY: i32 = 16;
pub const ENODEV: i32 = 19;
pub const EINVAL: i32 = 22;
pub const EPROBE_DEFER: i32 = 517;
