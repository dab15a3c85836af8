pub mod decoder;
pub mod header;
pub mod value;

pub use decoder::{decode, ParamSfo, ParamSummary, UNKNOWN_TITLE};
pub use header::{SfoEntry, SfoHeader, PSF_SIGNATURE};
pub use value::SfoValue;
