pub mod dates;
pub mod flow;
pub mod session;
