pub mod content;
pub mod objective;
pub mod segment;
pub mod errors;

pub use content::*;
pub use objective::*;
pub use segment::*;
pub use errors::*;
