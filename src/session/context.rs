//! State threaded through every bring-up phase.
//!
//! `SessionContext` owns the platform adapters and accumulates what the
//! phases learn: the current baseline, the track topology and the
//! negotiated hostname.  Later phases read what earlier ones wrote; there is
//! no other shared state.

use crate::app::ports::Platform;
use crate::config::SystemConfig;
use crate::sensors::calibration::CurrentCalibration;
use crate::track::TrackTopology;

pub struct SessionContext<P: Platform> {
    pub board: P::Board,
    pub net: P::Net,
    pub store: P::Store,
    /// Handed to the serve loop when serving starts.
    pub stream: Option<P::Stream>,
    /// Handed to the serve loop when serving starts.
    pub log: Option<P::Log>,

    pub config: SystemConfig,

    // --- Written by the phases ---
    pub calibration: Option<CurrentCalibration>,
    pub topology: Option<TrackTopology>,
    pub profile_id: Option<u32>,
    pub hostname: Option<String>,
}

impl<P: Platform> SessionContext<P> {
    pub fn new(
        board: P::Board,
        net: P::Net,
        store: P::Store,
        stream: P::Stream,
        log: P::Log,
        config: SystemConfig,
    ) -> Self {
        Self {
            board,
            net,
            store,
            stream: Some(stream),
            log: Some(log),
            config,
            calibration: None,
            topology: None,
            profile_id: None,
            hostname: None,
        }
    }
}
