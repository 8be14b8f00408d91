// crates/lazulite/src/session.rs
//! Per-conversation control block: send/receive queues, ACK and UNA
//! accounting, retransmission timers and the congestion window, driven by
//! the caller through `input`, `update` and the output sink.

use crate::config::{Config, NoDelay};
use crate::congestion::Congestion;
use crate::consts::{
    DEAD_LINK_STATE, INTERVAL_MAX, INTERVAL_MIN, MTU_MIN, OVERHEAD, PROBE_INIT, PROBE_LIMIT,
    WND_RCV,
};
use crate::error::{Result, SessionError};
use crate::rtt::RttEstimator;
use crate::segment::{Command, Segment};
use bytes::{Buf, BytesMut};
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

// Probe bits: WASK pending / WINS pending.
const ASK_SEND: u8 = 1;
const ASK_TELL: u8 = 2;

// A flush deadline this far from the clock means the clock jumped; resync
// instead of flushing in a tight loop.
const CLOCK_RESYNC_MS: i32 = 10_000;

/// Signed distance between two wrapping 32-bit sequence numbers or
/// timestamps. The subtraction must wrap in 32 bits; widening would break
/// ordering across the wrap point.
#[inline]
fn timediff(later: u32, earlier: u32) -> i32 {
    later.wrapping_sub(earlier) as i32
}

/// Sink for the datagrams produced by [`Session::flush`].
///
/// Called synchronously from `flush`; it must not block, or segment order
/// within one flush is no longer guaranteed by the time it hits the wire.
pub trait Output {
    /// Hands one encoded datagram, never larger than the session MTU, to
    /// the transport.
    fn send(&mut self, datagram: &[u8]);
}

impl<F: FnMut(&[u8])> Output for F {
    fn send(&mut self, datagram: &[u8]) {
        self(datagram)
    }
}

/// A reliable, ordered conversation over an unreliable datagram substrate.
///
/// The session never performs I/O on its own: `send` queues application
/// bytes, `input` consumes datagrams the caller read off the wire, and
/// `update`/`flush` push encoded datagrams into the [`Output`] sink. All
/// methods must be externally serialized per session; distinct sessions are
/// independent.
///
/// Timestamps are caller-supplied milliseconds from any monotonic source;
/// they may wrap.
pub struct Session<O: Output> {
    conv: u32,
    mtu: usize,
    mss: usize,
    /// 0 while healthy, [`DEAD_LINK_STATE`] once a segment has been
    /// transmitted `dead_link` times.
    state: u32,

    snd_una: u32,
    snd_nxt: u32,
    rcv_nxt: u32,

    snd_wnd: u16,
    rcv_wnd: u16,
    rmt_wnd: u16,

    rtt: RttEstimator,
    congestion: Congestion,

    current: u32,
    interval: u32,
    ts_flush: u32,
    updated: bool,

    probe: u8,
    ts_probe: u32,
    probe_wait: u32,

    nodelay: NoDelay,
    fastresend: u32,
    fastlimit: u32,
    nocwnd: bool,
    stream: bool,
    fastack_conserve: bool,

    dead_link: u32,
    /// Cumulative retransmission count.
    xmit: u32,

    /// Application segments waiting for a sequence number.
    snd_queue: VecDeque<Segment>,
    /// In-flight segments, ascending by sn within [snd_una, snd_nxt).
    snd_buf: VecDeque<Segment>,
    /// Out-of-order arrivals, ascending by sn, all >= rcv_nxt.
    rcv_buf: VecDeque<Segment>,
    /// Contiguous segments ready for delivery.
    rcv_queue: VecDeque<Segment>,

    /// Pending (sn, ts) acknowledgements, emitted on the next flush.
    acklist: Vec<(u32, u32)>,
    /// Scratch space for one outgoing datagram.
    buffer: BytesMut,

    output: O,
}

impl<O: Output> Session<O> {
    /// Creates a session with protocol defaults. Both endpoints must agree
    /// on `conv` out of band.
    pub fn new(conv: u32, output: O) -> Result<Self> {
        Self::with_config(conv, Config::default(), output)
    }

    /// Creates a session with explicit tuning.
    ///
    /// Fails with [`SessionError::InvalidMtu`] when `config.mtu` is below
    /// the floor [`Session::set_mtu`] enforces.
    pub fn with_config(conv: u32, config: Config, output: O) -> Result<Self> {
        if config.mtu < MTU_MIN || config.mtu < OVERHEAD {
            return Err(SessionError::InvalidMtu(config.mtu));
        }

        let mut rtt = RttEstimator::default();
        rtt.set_min_rto(config.nodelay.min_rto());
        let interval = config.interval.clamp(INTERVAL_MIN, INTERVAL_MAX);

        Ok(Session {
            conv,
            mtu: config.mtu,
            mss: config.mtu - OVERHEAD,
            state: 0,
            snd_una: 0,
            snd_nxt: 0,
            rcv_nxt: 0,
            snd_wnd: config.snd_wnd,
            rcv_wnd: config.rcv_wnd.max(WND_RCV),
            rmt_wnd: WND_RCV,
            rtt,
            congestion: Congestion::default(),
            current: 0,
            interval,
            ts_flush: interval,
            updated: false,
            probe: 0,
            ts_probe: 0,
            probe_wait: 0,
            nodelay: config.nodelay,
            fastresend: config.fastresend,
            fastlimit: config.fastlimit,
            nocwnd: config.nocwnd,
            stream: config.stream,
            fastack_conserve: config.fastack_conserve,
            dead_link: config.dead_link,
            xmit: 0,
            snd_queue: VecDeque::new(),
            snd_buf: VecDeque::new(),
            rcv_buf: VecDeque::new(),
            rcv_queue: VecDeque::new(),
            acklist: Vec::new(),
            buffer: BytesMut::with_capacity((config.mtu + OVERHEAD) * 3),
            output,
        })
    }

    // --- Send path ---

    /// Queues application bytes for transmission and returns how many were
    /// accepted. Nothing goes on the wire until the next flush.
    ///
    /// In stream mode the tail of the send queue is topped up to a full
    /// segment before new fragments are cut; message boundaries are not
    /// preserved. In message mode the buffer is fragmented and delivered as
    /// one unit by the peer's `recv`.
    pub fn send(&mut self, mut buf: &[u8]) -> Result<usize> {
        let mut accepted = 0usize;

        if self.stream {
            if let Some(tail) = self.snd_queue.back_mut() {
                if tail.data.len() < self.mss {
                    let extend = buf.len().min(self.mss - tail.data.len());
                    let (merge, rest) = buf.split_at(extend);
                    tail.data.extend_from_slice(merge);
                    tail.frg = 0;
                    buf = rest;
                    accepted += extend;
                    trace!("send merged {} bytes into the queue tail", extend);
                }
            }
            if buf.is_empty() {
                return Ok(accepted);
            }
        }

        let count = if buf.len() <= self.mss {
            1
        } else {
            buf.len().div_ceil(self.mss)
        };
        if count >= WND_RCV as usize {
            debug!("send of {} bytes needs {} fragments, over the limit", buf.len(), count);
            return Err(SessionError::MessageTooLarge {
                fragments: count,
                limit: WND_RCV as usize,
            });
        }

        trace!("send {} bytes as {} fragment(s)", buf.len(), count);

        for i in 0..count {
            let size = buf.len().min(self.mss);
            let (chunk, rest) = buf.split_at(size);
            let mut segment = Segment::with_data(Command::Push, BytesMut::from(chunk));
            // The last fragment carries 0 so the receiver can spot a whole
            // message; stream mode has no message boundaries to mark.
            segment.frg = if self.stream { 0 } else { (count - i - 1) as u8 };
            self.snd_queue.push_back(segment);
            buf = rest;
            accepted += size;
        }

        Ok(accepted)
    }

    // --- Receive path ---

    /// Size of the next complete message, without consuming it.
    pub fn peek_size(&self) -> Result<usize> {
        let head = self.rcv_queue.front().ok_or(SessionError::RecvQueueEmpty)?;
        if head.frg == 0 {
            return Ok(head.data.len());
        }
        if self.rcv_queue.len() < head.frg as usize + 1 {
            return Err(SessionError::FragmentIncomplete);
        }
        let mut len = 0;
        for segment in &self.rcv_queue {
            len += segment.data.len();
            if segment.frg == 0 {
                break;
            }
        }
        Ok(len)
    }

    /// Copies the next complete message into `buf` and consumes it.
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let size = self.peek_size()?;
        if size > buf.len() {
            return Err(SessionError::BufferTooSmall {
                needed: size,
                given: buf.len(),
            });
        }

        let full_before = self.rcv_queue.len() >= self.rcv_wnd as usize;

        let mut pos = 0;
        while let Some(segment) = self.rcv_queue.pop_front() {
            buf[pos..pos + segment.data.len()].copy_from_slice(&segment.data);
            pos += segment.data.len();
            trace!("recv sn={} frg={}", segment.sn, segment.frg);
            if segment.frg == 0 {
                break;
            }
        }
        debug_assert_eq!(pos, size);

        self.drain_rcv_buf();

        // The queue was wedged against the window; advertise the reopened
        // space on the next flush so the remote resumes.
        if full_before && self.rcv_queue.len() < self.rcv_wnd as usize {
            self.probe |= ASK_TELL;
        }

        Ok(pos)
    }

    /// Copies the next complete message into `buf` without consuming it.
    pub fn peek(&self, buf: &mut [u8]) -> Result<usize> {
        let size = self.peek_size()?;
        if size > buf.len() {
            return Err(SessionError::BufferTooSmall {
                needed: size,
                given: buf.len(),
            });
        }
        let mut pos = 0;
        for segment in &self.rcv_queue {
            buf[pos..pos + segment.data.len()].copy_from_slice(&segment.data);
            pos += segment.data.len();
            if segment.frg == 0 {
                break;
            }
        }
        Ok(pos)
    }

    /// Moves whatever became contiguous from `rcv_buf` into the delivery
    /// queue, bounded by the receive window.
    fn drain_rcv_buf(&mut self) {
        while self.rcv_buf.front().is_some_and(|segment| {
            segment.sn == self.rcv_nxt && self.rcv_queue.len() < self.rcv_wnd as usize
        }) {
            if let Some(segment) = self.rcv_buf.pop_front() {
                self.rcv_queue.push_back(segment);
                self.rcv_nxt = self.rcv_nxt.wrapping_add(1);
            }
        }
    }

    // --- Input path ---

    /// Feeds one datagram (or several concatenated) received from the
    /// substrate. Returns the number of bytes consumed.
    ///
    /// A malformed segment aborts the rest of the datagram but leaves the
    /// session usable.
    pub fn input(&mut self, data: &[u8]) -> Result<usize> {
        trace!("input {} bytes", data.len());
        if data.len() < OVERHEAD {
            return Err(SessionError::InputTooShort {
                size: data.len(),
                overhead: OVERHEAD,
            });
        }

        let old_una = self.snd_una;
        let mut ack_seen = false;
        let mut max_ack = 0u32;
        let mut latest_ts = 0u32;

        let mut buf: &[u8] = data;
        while buf.remaining() >= OVERHEAD {
            let segment = Segment::decode(&mut buf)?;
            if segment.conv != self.conv {
                debug!("input conv {:#010x} does not match {:#010x}", segment.conv, self.conv);
                return Err(SessionError::ConvMismatch {
                    expected: self.conv,
                    actual: segment.conv,
                });
            }

            self.rmt_wnd = segment.wnd;
            self.parse_una(segment.una);
            self.shrink_buf();

            match segment.cmd {
                Command::Ack => {
                    let rtt = timediff(self.current, segment.ts);
                    if rtt >= 0 {
                        self.rtt.update(rtt as u32, self.interval);
                    }
                    self.parse_ack(segment.sn);
                    self.shrink_buf();

                    if !ack_seen {
                        ack_seen = true;
                        max_ack = segment.sn;
                        latest_ts = segment.ts;
                    } else if timediff(segment.sn, max_ack) > 0
                        && (!self.fastack_conserve || timediff(segment.ts, latest_ts) > 0)
                    {
                        max_ack = segment.sn;
                        latest_ts = segment.ts;
                    }

                    trace!("input ack sn={} rtt={} rto={}", segment.sn, rtt, self.rtt.rto());
                }
                Command::Push => {
                    trace!("input push sn={} ts={}", segment.sn, segment.ts);
                    if timediff(segment.sn, self.rcv_nxt.wrapping_add(self.rcv_wnd as u32)) < 0 {
                        // Acknowledge anything inside the window, duplicates
                        // included, so a lost ACK cannot stall the remote.
                        self.acklist.push((segment.sn, segment.ts));
                        if timediff(segment.sn, self.rcv_nxt) >= 0 {
                            self.parse_data(segment);
                        }
                    }
                }
                Command::WindowAsk => {
                    trace!("input window probe");
                    self.probe |= ASK_TELL;
                }
                Command::WindowTell => {
                    // Nothing beyond the wnd field already recorded.
                    trace!("input window advertisement wnd={}", segment.wnd);
                }
            }
        }

        if ack_seen {
            self.parse_fastack(max_ack, latest_ts);
        }

        // Cumulative progress opens the congestion window.
        if timediff(self.snd_una, old_una) > 0 && self.congestion.window() < self.rmt_wnd {
            self.congestion.on_progress(self.mss, self.rmt_wnd);
        }

        Ok(data.len() - buf.remaining())
    }

    /// Drops every in-flight segment the cumulative `una` acknowledges.
    fn parse_una(&mut self, una: u32) {
        while let Some(segment) = self.snd_buf.front() {
            if timediff(una, segment.sn) > 0 {
                self.snd_buf.pop_front();
            } else {
                break;
            }
        }
    }

    /// Advances `snd_una` to the oldest in-flight sequence number.
    fn shrink_buf(&mut self) {
        self.snd_una = match self.snd_buf.front() {
            Some(segment) => segment.sn,
            None => self.snd_nxt,
        };
    }

    /// Removes the one in-flight segment a selective ACK names.
    fn parse_ack(&mut self, sn: u32) {
        if timediff(sn, self.snd_una) < 0 || timediff(sn, self.snd_nxt) >= 0 {
            return;
        }
        for i in 0..self.snd_buf.len() {
            let diff = timediff(sn, self.snd_buf[i].sn);
            if diff == 0 {
                self.snd_buf.remove(i);
                break;
            }
            if diff < 0 {
                break;
            }
        }
    }

    /// Bumps the skip counter of every in-flight segment older than the
    /// highest ACKed sequence number of this input call.
    fn parse_fastack(&mut self, sn: u32, ts: u32) {
        if timediff(sn, self.snd_una) < 0 || timediff(sn, self.snd_nxt) >= 0 {
            return;
        }
        for segment in &mut self.snd_buf {
            if timediff(sn, segment.sn) < 0 {
                break;
            }
            if sn != segment.sn && (!self.fastack_conserve || timediff(ts, segment.ts) >= 0) {
                segment.fastack += 1;
            }
        }
    }

    /// Inserts an in-window PUSH into `rcv_buf`, rejecting duplicates, then
    /// drains whatever became contiguous.
    fn parse_data(&mut self, segment: Segment) {
        let sn = segment.sn;
        if timediff(sn, self.rcv_nxt.wrapping_add(self.rcv_wnd as u32)) >= 0
            || timediff(sn, self.rcv_nxt) < 0
        {
            return;
        }

        // Walk from the tail: in-order traffic lands there.
        let mut repeat = false;
        let mut index = self.rcv_buf.len();
        for existing in self.rcv_buf.iter().rev() {
            if existing.sn == sn {
                repeat = true;
                break;
            }
            if timediff(sn, existing.sn) > 0 {
                break;
            }
            index -= 1;
        }

        if repeat {
            trace!("duplicate push sn={} dropped", sn);
        } else {
            self.rcv_buf.insert(index, segment);
        }

        self.drain_rcv_buf();
    }

    // --- Flush ---

    /// Free space in the local receive window, advertised on every outgoing
    /// segment.
    fn wnd_unused(&self) -> u16 {
        let queued = self.rcv_queue.len();
        if queued < self.rcv_wnd as usize {
            self.rcv_wnd - queued as u16
        } else {
            0
        }
    }

    /// Emits the scratch buffer if appending `need` more bytes would push
    /// the datagram past the MTU.
    fn make_space(&mut self, need: usize) {
        if self.buffer.len() + need > self.mtu {
            self.dispatch();
        }
    }

    /// Hands the pending datagram to the output sink.
    fn dispatch(&mut self) {
        if !self.buffer.is_empty() {
            trace!("output {} bytes", self.buffer.len());
            self.output.send(&self.buffer);
            self.buffer.clear();
        }
    }

    /// Schedules WASK probes while the remote window is closed, backing off
    /// by half each round up to the cap.
    fn update_probe_state(&mut self) {
        if self.rmt_wnd == 0 {
            if self.probe_wait == 0 {
                self.probe_wait = PROBE_INIT;
                self.ts_probe = self.current.wrapping_add(self.probe_wait);
            } else if timediff(self.current, self.ts_probe) >= 0 {
                if self.probe_wait < PROBE_INIT {
                    self.probe_wait = PROBE_INIT;
                }
                self.probe_wait += self.probe_wait / 2;
                if self.probe_wait > PROBE_LIMIT {
                    self.probe_wait = PROBE_LIMIT;
                }
                self.ts_probe = self.current.wrapping_add(self.probe_wait);
                self.probe |= ASK_SEND;
            }
        } else {
            self.ts_probe = 0;
            self.probe_wait = 0;
        }
    }

    /// Emits pending ACKs, window probes, newly admitted segments and due
    /// retransmissions. A no-op until `update` has been called once.
    pub fn flush(&mut self) -> Result<()> {
        if !self.updated {
            return Ok(());
        }

        let current = self.current;
        let wnd_unused = self.wnd_unused();

        let mut ctl = Segment::new(Command::Ack);
        ctl.conv = self.conv;
        ctl.wnd = wnd_unused;
        ctl.una = self.rcv_nxt;

        // 1. Pending acknowledgements.
        for i in 0..self.acklist.len() {
            let (sn, ts) = self.acklist[i];
            self.make_space(OVERHEAD);
            ctl.sn = sn;
            ctl.ts = ts;
            ctl.encode(&mut self.buffer)?;
        }
        self.acklist.clear();

        // 2-4. Window probing. The probe segments reuse whatever sn/ts the
        // last ACK left in the template; receivers ignore both fields.
        self.update_probe_state();
        if self.probe & ASK_SEND != 0 {
            ctl.cmd = Command::WindowAsk;
            self.make_space(OVERHEAD);
            ctl.encode(&mut self.buffer)?;
            trace!("probe remote window");
        }
        if self.probe & ASK_TELL != 0 {
            ctl.cmd = Command::WindowTell;
            self.make_space(OVERHEAD);
            ctl.encode(&mut self.buffer)?;
            trace!("advertise local window {}", wnd_unused);
        }
        self.probe = 0;

        // 5. Admit queued segments under the effective window.
        let mut window = self.snd_wnd.min(self.rmt_wnd);
        if !self.nocwnd {
            window = window.min(self.congestion.window());
        }

        while timediff(self.snd_nxt, self.snd_una.wrapping_add(window as u32)) < 0 {
            let Some(mut segment) = self.snd_queue.pop_front() else {
                break;
            };
            segment.conv = self.conv;
            segment.cmd = Command::Push;
            segment.wnd = wnd_unused;
            segment.ts = current;
            segment.sn = self.snd_nxt;
            segment.una = self.rcv_nxt;
            segment.resendts = current;
            segment.rto = self.rtt.rto();
            segment.fastack = 0;
            segment.xmit = 0;
            self.snd_nxt = self.snd_nxt.wrapping_add(1);
            self.snd_buf.push_back(segment);
        }

        // 6. Walk the in-flight buffer for first sends, timeouts and fast
        // retransmissions.
        let resent = if self.fastresend > 0 { self.fastresend } else { u32::MAX };
        let rtomin = if self.nodelay.is_enabled() { 0 } else { self.rtt.rto() >> 3 };

        let mut lost = false;
        let mut change = 0u32;

        for i in 0..self.snd_buf.len() {
            let rto_now = self.rtt.rto();
            let mut need_send = false;
            {
                let segment = &mut self.snd_buf[i];
                if segment.xmit == 0 {
                    need_send = true;
                    segment.xmit += 1;
                    segment.rto = rto_now;
                    segment.resendts = current.wrapping_add(segment.rto).wrapping_add(rtomin);
                } else if timediff(current, segment.resendts) >= 0 {
                    need_send = true;
                    segment.xmit += 1;
                    self.xmit += 1;
                    segment.rto = match self.nodelay {
                        NoDelay::Off => segment.rto + segment.rto.max(rto_now),
                        NoDelay::On => segment.rto + segment.rto / 2,
                        NoDelay::Aggressive => segment.rto + rto_now / 2,
                    };
                    segment.resendts = current.wrapping_add(segment.rto);
                    lost = true;
                    trace!("timeout resend sn={} xmit={} rto={}", segment.sn, segment.xmit, segment.rto);
                } else if segment.fastack >= resent
                    && (segment.xmit <= self.fastlimit || self.fastlimit == 0)
                {
                    need_send = true;
                    segment.xmit += 1;
                    segment.fastack = 0;
                    segment.resendts = current.wrapping_add(segment.rto);
                    change += 1;
                    trace!("fast resend sn={} xmit={}", segment.sn, segment.xmit);
                }
            }

            if need_send {
                let need = OVERHEAD + self.snd_buf[i].data.len();
                self.make_space(need);

                let rcv_nxt = self.rcv_nxt;
                {
                    let segment = &mut self.snd_buf[i];
                    segment.ts = current;
                    segment.wnd = wnd_unused;
                    segment.una = rcv_nxt;
                }
                self.snd_buf[i].encode(&mut self.buffer)?;

                if self.snd_buf[i].xmit >= self.dead_link {
                    warn!(
                        "segment sn={} transmitted {} times, link declared dead",
                        self.snd_buf[i].sn, self.snd_buf[i].xmit
                    );
                    self.state = DEAD_LINK_STATE;
                }
            }
        }

        // 7. Remainder of the last datagram.
        self.dispatch();

        // 8-10. Congestion reactions for this flush.
        if change > 0 {
            let inflight = self.snd_nxt.wrapping_sub(self.snd_una);
            self.congestion.on_fast_resend(inflight, change, self.mss);
        }
        if lost {
            self.congestion.on_loss(window, self.mss);
        }
        self.congestion.apply_floor(self.mss);

        Ok(())
    }

    // --- Scheduling ---

    /// Advances the session clock and flushes when the cadence deadline has
    /// passed. Call every 10-100 ms, or at the instant `check` returns.
    pub fn update(&mut self, current: u32) -> Result<()> {
        self.current = current;

        if !self.updated {
            self.updated = true;
            self.ts_flush = current;
        }

        let mut slap = timediff(current, self.ts_flush);
        if !(-CLOCK_RESYNC_MS..CLOCK_RESYNC_MS).contains(&slap) {
            self.ts_flush = current;
            slap = 0;
        }

        if slap >= 0 {
            self.ts_flush = self.ts_flush.wrapping_add(self.interval);
            if timediff(current, self.ts_flush) >= 0 {
                self.ts_flush = current.wrapping_add(self.interval);
            }
            self.flush()?;
        }

        Ok(())
    }

    /// When the next `update` is due, as an absolute timestamp: the flush
    /// deadline or the earliest retransmission, whichever comes first,
    /// never further out than one interval. Returns `current` when work is
    /// already pending.
    pub fn check(&self, current: u32) -> u32 {
        if !self.updated {
            return current;
        }

        let mut ts_flush = self.ts_flush;
        if !(-CLOCK_RESYNC_MS..CLOCK_RESYNC_MS).contains(&timediff(current, ts_flush)) {
            ts_flush = current;
        }
        if timediff(current, ts_flush) >= 0 {
            return current;
        }

        let tm_flush = timediff(ts_flush, current);
        let mut tm_packet = i32::MAX;
        for segment in &self.snd_buf {
            let diff = timediff(segment.resendts, current);
            if diff <= 0 {
                return current;
            }
            tm_packet = tm_packet.min(diff);
        }

        let minimal = (tm_packet.min(tm_flush) as u32).min(self.interval);
        current.wrapping_add(minimal)
    }

    // --- Tuning ---

    /// Changes the MTU; fails below the 50-byte floor. Grows the scratch
    /// buffer to hold three datagrams of the new size.
    pub fn set_mtu(&mut self, mtu: usize) -> Result<()> {
        if mtu < MTU_MIN || mtu < OVERHEAD {
            return Err(SessionError::InvalidMtu(mtu));
        }
        self.mtu = mtu;
        self.mss = mtu - OVERHEAD;
        let target = (mtu + OVERHEAD) * 3;
        if target > self.buffer.capacity() {
            self.buffer.reserve(target - self.buffer.capacity());
        }
        Ok(())
    }

    /// Sets the send and receive windows in segments; 0 leaves a side
    /// unchanged. The receive window never drops below 128, the largest
    /// legal fragment count.
    pub fn set_wndsize(&mut self, snd: u16, rcv: u16) {
        if snd > 0 {
            self.snd_wnd = snd;
        }
        if rcv > 0 {
            self.rcv_wnd = rcv.max(WND_RCV);
        }
    }

    /// Applies the classic four-knob tuning in one call. The fastest
    /// profile is `set_nodelay(NoDelay::On, 10, 2, true)`.
    pub fn set_nodelay(&mut self, nodelay: NoDelay, interval: u32, resend: u32, nocwnd: bool) {
        self.set_delay_mode(nodelay);
        self.set_interval(interval);
        self.set_fast_resend(resend);
        self.set_nocwnd(nocwnd);
    }

    /// Switches the retransmission-delay profile and its RTO floor.
    pub fn set_delay_mode(&mut self, nodelay: NoDelay) {
        self.nodelay = nodelay;
        self.rtt.set_min_rto(nodelay.min_rto());
    }

    /// Sets the flush cadence, clamped to [10, 5000] ms.
    pub fn set_interval(&mut self, interval: u32) {
        self.interval = interval.clamp(INTERVAL_MIN, INTERVAL_MAX);
    }

    /// Fast-retransmit after `resend` duplicate ACKs; 0 disables.
    pub fn set_fast_resend(&mut self, resend: u32) {
        self.fastresend = resend;
    }

    /// Cap on fast retransmissions of one segment; 0 removes the cap.
    pub fn set_fast_limit(&mut self, limit: u32) {
        self.fastlimit = limit;
    }

    /// Disables the congestion window; the remote window still binds.
    pub fn set_nocwnd(&mut self, nocwnd: bool) {
        self.nocwnd = nocwnd;
    }

    /// Transmissions of one segment after which the link counts as dead.
    pub fn set_dead_link(&mut self, dead_link: u32) {
        self.dead_link = dead_link;
    }

    /// Overrides the RTO floor directly.
    pub fn set_rx_minrto(&mut self, minrto: u32) {
        self.rtt.set_min_rto(minrto);
    }

    // --- Queries ---

    /// Conversation id.
    pub fn conv(&self) -> u32 {
        self.conv
    }

    pub fn mtu(&self) -> usize {
        self.mtu
    }

    /// Maximum payload per segment.
    pub fn mss(&self) -> usize {
        self.mss
    }

    pub fn snd_wnd(&self) -> u16 {
        self.snd_wnd
    }

    pub fn rcv_wnd(&self) -> u16 {
        self.rcv_wnd
    }

    /// Receive window most recently advertised by the remote.
    pub fn rmt_wnd(&self) -> u16 {
        self.rmt_wnd
    }

    /// Segments queued or in flight, not yet acknowledged.
    pub fn wait_snd(&self) -> usize {
        self.snd_buf.len() + self.snd_queue.len()
    }

    /// Cumulative retransmission count over the session lifetime.
    pub fn xmit(&self) -> u32 {
        self.xmit
    }

    pub fn is_stream(&self) -> bool {
        self.stream
    }

    /// 0 while healthy, `0xFFFFFFFF` once the link is dead.
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Whether any segment has hit the dead-link transmission limit.
    pub fn is_dead_link(&self) -> bool {
        self.state != 0
    }

    /// Wire size of a segment header.
    pub const fn header_len() -> usize {
        OVERHEAD
    }
}
