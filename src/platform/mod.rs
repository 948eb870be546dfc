// linux-armoury - platform layer
//
// OS integration: filesystem locations, subprocess execution with
// deadlines, and sysfs access. All paths are injectable so the app layer
// tests against fake trees.

pub mod config;
pub mod exec;
pub mod sysfs;
