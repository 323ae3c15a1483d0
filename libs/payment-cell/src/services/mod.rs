pub mod gateway;
pub mod handoff;
