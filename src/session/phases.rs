//! Concrete phase actions and the table builder.
//!
//! ```text
//!  SelfTest ─▶ Calibrate ─▶ AssociateTemporary ─▶ CaptureTopology
//!                                                      │
//!            Serve ◀── AssociatePermanent ◀────────────┘
//! ```

use log::{info, warn};

use super::context::SessionContext;
use super::{PhaseDescriptor, PhaseId};
use crate::app::capture::{CaptureSettings, capture};
use crate::app::events::Feedback;
use crate::app::hostname::uniqueify;
use crate::app::ports::{ClockPort, FeedbackPort, NetworkPort, Platform};
use crate::app::profiles::ProfileBook;
use crate::app::telemetry::ServeLoop;
use crate::error::{NetworkError, SessionError};
use crate::sensors::calibration::CurrentCalibration;
use crate::track::{MAX_LANES, TrackTopology};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the bring-up table.  Row order is execution order.
pub fn phase_table<P: Platform>() -> [PhaseDescriptor<SessionContext<P>>; PhaseId::COUNT] {
    [
        PhaseDescriptor {
            name: PhaseId::SelfTest.name(),
            run: SessionContext::<P>::self_test,
        },
        PhaseDescriptor {
            name: PhaseId::Calibrate.name(),
            run: SessionContext::<P>::calibrate,
        },
        PhaseDescriptor {
            name: PhaseId::AssociateTemporary.name(),
            run: SessionContext::<P>::associate_temporary,
        },
        PhaseDescriptor {
            name: PhaseId::CaptureTopology.name(),
            run: SessionContext::<P>::capture_topology,
        },
        PhaseDescriptor {
            name: PhaseId::AssociatePermanent.name(),
            run: SessionContext::<P>::associate_permanent,
        },
        PhaseDescriptor {
            name: PhaseId::Serve.name(),
            run: SessionContext::<P>::serve,
        },
    ]
}

impl<P: Platform> SessionContext<P> {
    // ═══════════════════════════════════════════════════════════════════════
    //  SELF-TEST
    // ═══════════════════════════════════════════════════════════════════════

    fn self_test(&mut self) -> Result<(), SessionError> {
        // The start-up cue flashes every LED before the sweep.
        self.board.signal(Feedback::StartUp);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    //  CALIBRATE
    // ═══════════════════════════════════════════════════════════════════════

    fn calibrate(&mut self) -> Result<(), SessionError> {
        let cal = CurrentCalibration::measure(&mut self.board, self.config.calibration_samples);
        self.calibration = Some(cal);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    //  ASSOCIATE (TEMPORARY)
    // ═══════════════════════════════════════════════════════════════════════

    fn associate_temporary(&mut self) -> Result<(), SessionError> {
        let ssid = self.config.network.ssid.as_str();

        match self.net.scan(ssid) {
            Ok(true) => {}
            Ok(false) => {
                warn!("network '{}' not found", ssid);
                return Err(SessionError::NoSuchNetwork);
            }
            Err(e) => {
                warn!("scan for '{}' failed: {}", ssid, e);
                return Err(SessionError::NoSuchNetwork);
            }
        }

        // Throwaway name so probing never collides with a real logger.
        let temporary = format!("{}-{}", self.config.hostname_prefix, self.board.now_ms());
        if let Err(e) = self.net.set_hostname(&temporary) {
            warn!("temporary hostname '{}' rejected: {}", temporary, e);
        }

        match self.net.associate(ssid, &self.config.network.password) {
            Ok(()) => {
                info!("associated with '{}' as '{}'", ssid, temporary);
                Ok(())
            }
            Err(NetworkError::AuthFailed) => Err(SessionError::BadCredentials),
            Err(e) => {
                warn!("association with '{}' failed: {}", ssid, e);
                Err(SessionError::AssociationFailed)
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    //  CAPTURE TOPOLOGY
    // ═══════════════════════════════════════════════════════════════════════

    fn capture_topology(&mut self) -> Result<(), SessionError> {
        let settings = CaptureSettings::from(&self.config);

        info!("enter the number of lanes");
        let lane_count = capture(&mut self.board, &settings, 1, MAX_LANES);
        info!("enter your lane (1-{})", lane_count);
        let my_lane = capture(&mut self.board, &settings, 1, lane_count);

        let topology = TrackTopology::from_capture(lane_count, my_lane)?;
        info!(
            "track: {} lanes, lane {} is {}",
            topology.lane_count(),
            topology.my_lane(),
            topology.colour()
        );
        self.topology = Some(topology);
        self.profile_id = self.store_profile(&topology);
        Ok(())
    }

    fn store_profile(&mut self, topology: &TrackTopology) -> Option<u32> {
        let mut book = match ProfileBook::load(&self.store) {
            Ok(book) => book,
            Err(e) => {
                warn!("profiles unreadable ({}), starting a new book", e);
                ProfileBook::default()
            }
        };
        let id = book.record_topology(&self.config.track_name, topology);
        match book.save(&mut self.store) {
            Ok(()) => Some(id),
            Err(e) => {
                warn!("profile #{} not saved: {}", id, e);
                None
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    //  ASSOCIATE (PERMANENT)
    // ═══════════════════════════════════════════════════════════════════════

    fn associate_permanent(&mut self) -> Result<(), SessionError> {
        let topology = self.topology.ok_or(SessionError::AssociationFailed)?;
        let base = format!("{}-{}", self.config.hostname_prefix, topology.colour());
        let name = uniqueify(&base, topology.palette(), &mut self.net)?;

        self.net.disconnect();
        self.net.set_hostname(&name).map_err(|e| {
            warn!("hostname '{}' rejected: {}", name, e);
            SessionError::AssociationFailed
        })?;
        self.net
            .associate(&self.config.network.ssid, &self.config.network.password)
            .map_err(|e| {
                warn!("re-association as '{}' failed: {}", name, e);
                SessionError::AssociationFailed
            })?;

        match self.net.current_ip() {
            Some(ip) => info!("joined as '{}' at {}", name, ip),
            None => info!("joined as '{}'", name),
        }
        self.hostname = Some(name);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    //  SERVE
    // ═══════════════════════════════════════════════════════════════════════

    fn serve(&mut self) -> Result<(), SessionError> {
        if let Some(name) = &self.hostname {
            if let Err(e) = self.net.advertise(name) {
                warn!("mDNS advertisement for '{}' failed: {}", name, e);
            }
        }

        let (Some(stream), Some(log)) = (self.stream.take(), self.log.take()) else {
            return Err(SessionError::ServeFailed);
        };
        let mut server = ServeLoop::new(
            stream,
            log,
            self.calibration.unwrap_or_default(),
            self.config.telemetry_interval_ms,
            self.config.debounce_ms,
        );
        let identity = self.hostname.clone().unwrap_or_default();
        server.run(&mut self.board, &identity)
    }
}
