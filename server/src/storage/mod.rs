pub mod client;
pub mod msg;
pub mod svc;
