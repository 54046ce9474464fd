pub mod error;
pub mod outcome;
pub mod record;
pub mod traits;

pub use self::error::*;
pub use self::outcome::*;
pub use self::record::*;
pub use self::traits::*;
