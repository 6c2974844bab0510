// src/lib.rs
pub mod inspector {
    pub use crate::types::{InspectorReport, Options};

    /// Demuxes the whole file and returns per-track statistics
    pub fn run(opts: Options) -> anyhow::Result<InspectorReport> {
        crate::core::run(opts)
    }
}

pub mod constants;
pub mod demuxer;
pub mod error;
pub mod es;
pub mod parsers;
pub mod pes;
pub mod pool;
pub mod probe;
pub mod report;
pub mod scanner;
pub mod stats;
pub mod track;
pub mod types;

mod core;

pub use demuxer::{ParserFactory, PsDemuxer};
pub use error::{DemuxError, Result};
pub use es::{ByteSupply, FrameParser, MpegVideoParser};
pub use pes::{PesHeader, PesPacket};
pub use pool::BufferPool;
pub use probe::{is_elementary_video, probe};
pub use track::TrackHandle;
pub use types::{DemuxerConfig, Frame, MediaType, TrackInfo, TrackKind};
