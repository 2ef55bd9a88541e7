pub mod board;
pub mod config;
pub mod habit;
pub mod priority;
pub mod watch;
pub mod week;
pub mod whoami;
