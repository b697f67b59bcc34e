pub mod backup;
pub mod config;
pub mod db;
pub mod gate;
pub mod grade;
pub mod ipc;
pub mod logging;
pub mod session;
pub mod store;
