pub mod file;
pub mod classification;
pub mod record;
pub mod proposal;
pub mod partial;
pub mod merged;

pub use file::*;
pub use classification::*;
pub use record::*;
pub use proposal::*;
pub use partial::*;
pub use merged::*;
