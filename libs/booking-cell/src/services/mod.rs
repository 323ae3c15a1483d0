pub mod controller;
pub mod flow;
pub mod intake;
pub mod registry;
pub mod snapshot;
