// linux-armoury
//
// Control panel for ASUS gaming laptops on Linux: power profiles, TDP
// limits, display refresh rates, battery charge limits, keyboard
// lighting, and AC/battery auto-switching.
//
// Layering:
//   core     - pure domain logic, no I/O
//   platform - filesystem, subprocess, and sysfs access
//   app      - orchestration on top of core and platform
//   util     - constants, errors, logging

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
