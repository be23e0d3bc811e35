pub mod monitor;
pub mod reset;
pub mod schedule;
pub mod server;
pub mod worker;
