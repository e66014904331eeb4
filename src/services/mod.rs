//! Services around the resize pipeline: decoding, source resolution and
//! change fingerprints

pub mod fingerprint;
pub mod io;
pub mod source;

pub use fingerprint::ChangeFingerprint;
pub use io::{FrameDecoder, ImageFrameDecoder};
pub use source::{ImageSource, PathResolver, ResolveStrategy, SourceResolver};
