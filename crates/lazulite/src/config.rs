// crates/lazulite/src/config.rs
use crate::consts::{DEADLINK, FASTACK_LIMIT, INTERVAL, MTU_DEF, RTO_MIN, RTO_NDL, WND_RCV, WND_SND};

/// Retransmission-delay profile, trading bandwidth for latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoDelay {
    /// Conservative: RTO floor 100 ms, a timed-out segment doubles its RTO,
    /// first transmissions get an extra RTO/8 of grace.
    #[default]
    Off,
    /// Low latency: RTO floor 30 ms, a timed-out RTO grows by half of
    /// itself, no first-transmission grace.
    On,
    /// Lowest latency: like `On` but a timed-out RTO grows by half the
    /// smoothed RTO, independent of how far backoff has already gone.
    Aggressive,
}

impl NoDelay {
    /// Minimum RTO this profile allows.
    pub fn min_rto(self) -> u32 {
        match self {
            NoDelay::Off => RTO_MIN,
            NoDelay::On | NoDelay::Aggressive => RTO_NDL,
        }
    }

    pub(crate) fn is_enabled(self) -> bool {
        !matches!(self, NoDelay::Off)
    }
}

/// Session tuning, applied at construction.
///
/// The defaults reproduce the upstream protocol defaults; every knob can
/// also be changed later through the session setters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum transmission unit, header included.
    pub mtu: usize,
    /// Send window, in segments.
    pub snd_wnd: u16,
    /// Receive window, in segments; raised to at least 128.
    pub rcv_wnd: u16,
    /// Flush cadence in milliseconds, clamped to [10, 5000].
    pub interval: u32,
    pub nodelay: NoDelay,
    /// Fast-retransmit after this many duplicate ACKs; 0 disables.
    pub fastresend: u32,
    /// Cap on fast retransmissions of one segment; 0 removes the cap.
    pub fastlimit: u32,
    /// Disable the congestion window; the remote window still binds.
    pub nocwnd: bool,
    /// Stream mode: coalesce writes and re-fragment freely instead of
    /// preserving message boundaries.
    pub stream: bool,
    /// Transmissions of one segment after which the link counts as dead.
    pub dead_link: u32,
    /// Only count a duplicate ACK against a segment when the ACK's
    /// timestamp is not older than the segment's.
    pub fastack_conserve: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mtu: MTU_DEF,
            snd_wnd: WND_SND,
            rcv_wnd: WND_RCV,
            interval: INTERVAL,
            nodelay: NoDelay::default(),
            fastresend: 0,
            fastlimit: FASTACK_LIMIT,
            nocwnd: false,
            stream: false,
            dead_link: DEADLINK,
            fastack_conserve: false,
        }
    }
}
