mod grow;
mod packed_guid;
mod scalar;
mod store_rdr;
mod store_wtr;

pub use grow::*;
pub use packed_guid::*;
pub use scalar::*;
pub use store_rdr::*;
pub use store_wtr::*;
