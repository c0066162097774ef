pub mod rate;
pub mod settings;
pub mod trade;

pub use rate::*;
pub use settings::keys as snapshot_keys;
pub use trade::*;
