pub mod check;
pub mod logging;
pub mod send;
