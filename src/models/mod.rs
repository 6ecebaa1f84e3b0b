pub mod contest;
pub mod prices;
pub mod response;
pub mod standings;

pub use contest::*;
pub use prices::*;
pub use response::*;
pub use standings::*;
