mod auditor;
mod base;
mod connection;
mod pipeline;
mod twitter;

pub use auditor::*;
pub use base::*;
pub use connection::*;
pub use pipeline::*;
pub use twitter::*;
