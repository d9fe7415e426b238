pub mod attrs;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod header;
pub mod nat;
pub mod packet;
pub mod router;
pub mod transaction;
pub mod transactor;
pub mod transport;
pub mod util;
