// linux-armoury - app layer
//
// Orchestration: settings and profile persistence, the backend chain,
// hardware managers, the auto-switch poll loop, the live monitor, and
// plugin hooks. This layer wires core logic to the platform layer.

pub mod autoswitch;
pub mod battery;
pub mod display;
pub mod fans;
pub mod hooks;
pub mod keyboard;
pub mod monitor;
pub mod power;
pub mod profile_mgr;
pub mod settings;
pub mod status;
