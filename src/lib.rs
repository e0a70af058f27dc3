// Library for tests to access modules

pub mod config;
pub mod diagnostics;
pub mod guide;
pub mod models;
pub mod registry;
pub mod routes;
pub mod scheduler;
pub mod simulator;
