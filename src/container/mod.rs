pub mod engine;
pub mod frame;
pub mod power;
pub mod rcon;
pub mod signals;
pub mod state;
pub mod status;
