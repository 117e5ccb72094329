//! Collision-free hostname negotiation.
//!
//! Several loggers on one track share a prefix and differ by lane colour
//! (`logger-<colour>`).  Before joining under a name the negotiator asks the
//! network who holds it and, when someone else does, moves the colour on to
//! the next palette entry, wrapping at the end:
//!
//! ```text
//!   logger-green ─ taken ─▶ logger-blue ─ taken ─▶ logger-yellow ─▶ …
//! ```
//!
//! A name without a palette colour gets the first one.  The walk is bounded
//! by the palette length; running out of candidates is a fatal
//! [`SessionError::NoAvailableHostname`].

use log::{debug, info, warn};

use crate::app::ports::NetworkPort;
use crate::error::SessionError;

/// A name under consideration: `base` alone, or `base-<colour>` where the
/// colour is a palette entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostnameCandidate<'a> {
    base: &'a str,
    suffix: Option<usize>,
    palette: &'a [&'a str],
}

impl<'a> HostnameCandidate<'a> {
    /// Split `name` into base and colour.  A trailing `-<word>` only counts
    /// as a suffix when the word is in the palette; otherwise the whole name
    /// is the base.
    pub fn parse(name: &'a str, palette: &'a [&'a str]) -> Self {
        let split = name.rsplit_once('-').and_then(|(base, colour)| {
            palette
                .iter()
                .position(|c| *c == colour)
                .map(|i| (base, Some(i)))
        });
        let (base, suffix) = split.unwrap_or((name, None));
        Self {
            base,
            suffix,
            palette,
        }
    }

    pub fn base(&self) -> &str {
        self.base
    }

    /// Palette colour currently carried, if any.
    pub fn suffix(&self) -> Option<&'a str> {
        self.suffix.and_then(|i| self.palette.get(i).copied())
    }

    pub fn full(&self) -> String {
        match self.suffix() {
            Some(s) => format!("{}-{}", self.base, s),
            None => self.base.to_string(),
        }
    }

    /// Replace the colour with the next one round the ring.  No colour goes
    /// to the first entry, the last entry wraps to the first.
    pub fn advance(&mut self) {
        if self.palette.is_empty() {
            return;
        }
        self.suffix = Some(match self.suffix {
            Some(i) => (i + 1) % self.palette.len(),
            None => 0,
        });
    }
}

/// Find a hostname nobody else on the network answers to.
///
/// Makes at most `palette.len()` probes, starting with `base` itself.  A
/// name that resolves to our own address is kept.  A failed probe counts as
/// taken.
pub fn uniqueify<N: NetworkPort + ?Sized>(
    base: &str,
    palette: &[&str],
    net: &mut N,
) -> Result<String, SessionError> {
    let own_ip = net.current_ip();
    let mut candidate = HostnameCandidate::parse(base, palette);
    let attempts = palette.len().max(1);

    for attempt in 0..attempts {
        if attempt > 0 {
            candidate.advance();
        }
        let name = candidate.full();

        match net.resolve(&name) {
            Ok(None) => {
                info!("hostname: '{}' is free", name);
                return Ok(name);
            }
            Ok(Some(ip)) if Some(ip) == own_ip => {
                info!("hostname: '{}' already ours ({})", name, ip);
                return Ok(name);
            }
            Ok(Some(ip)) => {
                debug!("hostname: '{}' taken by {}", name, ip);
            }
            Err(e) => {
                warn!("hostname: probe for '{}' failed ({}), trying next", name, e);
            }
        }
    }

    warn!("hostname: no free name for '{}' after {} probes", base, attempts);
    Err(SessionError::NoAvailableHostname)
}
