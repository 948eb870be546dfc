// linux-armoury - core layer
//
// Pure domain logic: profile definitions, hardware capability resolution,
// and parsers for external tool output. Nothing in this layer performs
// I/O or spawns processes.

pub mod detect;
pub mod model;
pub mod parse;
pub mod profile;
