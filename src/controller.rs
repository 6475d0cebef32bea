//! Two-phase rolling-buffer stream controller.
//!
//! The controller is the device side of the streaming protocol. It owns the
//! [`RowBuffer`] and the transport, and filters an image taller than the
//! buffer by loading it in two overlapping passes.
//!
//! # Cycle
//!
//! ```text
//! AwaitPhase1Rows → ProcessPhase1 → SendReady → AwaitGoSignal → AwaitPhase2Rows → ProcessPhase2
//!        ↑                                           │ timeout          │ timeout          │
//!        └───────────────────────────────────────────┴──────────────────┴──────────────────┘
//! ```
//!
//! A row timeout in phase 1 is reported and processing carries on with
//! whatever the buffer holds. A row timeout in phase 2, or a missing go
//! token, skips phase 2 processing for this cycle. Either way the next cycle
//! starts again at phase 1.

use crate::codec::LineCodec;
use crate::config::{FilterConfig, Settings, TransportSettings};
use crate::error::{AppResult, KuwaharaError};
use crate::filter::KuwaharaFilter;
use crate::image::{Phase, Pixel, RollingView, RowBuffer};
use crate::protocol::{wait_for_token, GO_TOKEN, READY_TOKEN};
use crate::transport::Transport;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Pause before [`StreamController::run`] retries a failed cycle.
pub const RESTART_PAUSE: Duration = Duration::from_millis(500);

/// Controller state; each variant names the work done on the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// Receive global rows `[0, B)` into the buffer
    AwaitPhase1Rows,
    /// Filter and emit rows `0..=phase_boundary`
    ProcessPhase1,
    /// Send the ready token
    SendReady,
    /// Scan for the go token
    AwaitGoSignal,
    /// Reload the buffer starting at the phase boundary row
    AwaitPhase2Rows,
    /// Filter and emit the remaining rows
    ProcessPhase2,
}

/// How phase 2 ended for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase2Outcome {
    /// Every phase 2 row was emitted
    Completed,
    /// The go token never arrived
    GoTimeout,
    /// Reception stalled on this global row; nothing was emitted
    RowTimeout {
        /// Global row that did not complete
        row: usize,
    },
}

/// Summary of one finished cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// 1-based cycle counter
    pub cycle: u64,
    /// Global row whose reception timed out in phase 1, if any
    pub phase1_timeout: Option<usize>,
    /// Filtered rows sent to the peer across both phases
    pub rows_emitted: usize,
    /// Phase 2 result
    pub phase2: Phase2Outcome,
}

/// Receive bounds used by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamTimeouts {
    /// Per-byte bound while receiving a row
    pub row: Duration,
    /// Total bound on the go-token scan
    pub go: Duration,
}

impl Default for StreamTimeouts {
    fn default() -> Self {
        Self::from(&TransportSettings::default())
    }
}

impl From<&TransportSettings> for StreamTimeouts {
    fn from(settings: &TransportSettings) -> Self {
        Self {
            row: settings.row_timeout,
            go: settings.go_timeout,
        }
    }
}

/// Device-side driver of the two-phase protocol.
///
/// # Example
///
/// ```
/// use kuwahara_stream::config::FilterConfig;
/// use kuwahara_stream::controller::{CycleState, StreamController, StreamTimeouts};
/// use kuwahara_stream::transport::MockTransport;
///
/// let config = FilterConfig { image_size: 4, buffer_capacity: 4, ..FilterConfig::default() };
/// let mut device = StreamController::new(config, StreamTimeouts::default(), MockTransport::new())?;
/// assert_eq!(device.state(), CycleState::AwaitPhase1Rows);
/// # Ok::<(), kuwahara_stream::error::KuwaharaError>(())
/// ```
pub struct StreamController<T: Transport> {
    config: FilterConfig,
    filter: KuwaharaFilter,
    codec: LineCodec,
    timeouts: StreamTimeouts,
    transport: T,
    /// Exclusively owned; nothing outside the controller touches it
    buffer: RowBuffer,
    state: CycleState,
    scratch: Vec<Pixel>,
    cycle: u64,
    report: CycleReport,
    restart_pause: Duration,
}

impl<T: Transport> StreamController<T> {
    /// Create a controller over `transport`.
    ///
    /// # Errors
    /// `Configuration` if `config` fails validation.
    pub fn new(config: FilterConfig, timeouts: StreamTimeouts, transport: T) -> AppResult<Self> {
        config.validate()?;
        let filter = KuwaharaFilter::from_config(&config)?;
        let codec = LineCodec::from_config(&config);
        let buffer = RowBuffer::new(config.buffer_capacity, config.image_size);

        Ok(Self {
            filter,
            codec,
            timeouts,
            transport,
            buffer,
            state: CycleState::AwaitPhase1Rows,
            scratch: Vec::with_capacity(config.image_size),
            cycle: 0,
            report: Self::blank_report(0),
            restart_pause: RESTART_PAUSE,
            config,
        })
    }

    /// Pause between a failed cycle and the next attempt in [`run`](Self::run)
    pub fn with_restart_pause(mut self, pause: Duration) -> Self {
        self.restart_pause = pause;
        self
    }

    /// Create a controller from loaded settings
    pub fn from_settings(settings: &Settings, transport: T) -> AppResult<Self> {
        Self::new(
            settings.filter,
            StreamTimeouts::from(&settings.transport),
            transport,
        )
    }

    /// State the next [`step`](Self::step) will execute
    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Filter geometry in use
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    fn blank_report(cycle: u64) -> CycleReport {
        CycleReport {
            cycle,
            phase1_timeout: None,
            rows_emitted: 0,
            phase2: Phase2Outcome::Completed,
        }
    }

    /// Execute the current state and advance.
    ///
    /// Returns the cycle report when this step finished a cycle.
    ///
    /// # Errors
    /// Link failures other than timeouts. The controller is reset to
    /// [`CycleState::AwaitPhase1Rows`] before the error is returned.
    pub fn step(&mut self) -> AppResult<Option<CycleReport>> {
        let result = self.execute();
        if result.is_err() {
            self.state = CycleState::AwaitPhase1Rows;
        }
        result
    }

    fn execute(&mut self) -> AppResult<Option<CycleReport>> {
        match self.state {
            CycleState::AwaitPhase1Rows => {
                self.cycle += 1;
                self.report = Self::blank_report(self.cycle);
                info!("Cycle {}: awaiting phase 1 rows", self.cycle);

                let rows = self.config.buffer_capacity;
                if let Err(row) = self.receive_rows(0, rows)? {
                    warn!("Phase 1 row {} timed out, continuing with buffer contents", row);
                    self.report.phase1_timeout = Some(row);
                }
                self.state = CycleState::ProcessPhase1;
                Ok(None)
            }
            CycleState::ProcessPhase1 => {
                let header = self.codec.encode_header(self.config.image_size);
                self.transport.send(header.as_bytes())?;
                let emitted = self.emit_phase(Phase::first(&self.config))?;
                self.report.rows_emitted += emitted;
                self.state = CycleState::SendReady;
                Ok(None)
            }
            CycleState::SendReady => {
                self.transport.send(READY_TOKEN)?;
                debug!("Ready token sent");
                self.state = CycleState::AwaitGoSignal;
                Ok(None)
            }
            CycleState::AwaitGoSignal => {
                if wait_for_token(&mut self.transport, GO_TOKEN, self.timeouts.go)? {
                    debug!("Go token received");
                    self.state = CycleState::AwaitPhase2Rows;
                    Ok(None)
                } else {
                    warn!(
                        "{}, skipping phase 2",
                        KuwaharaError::GoTimeout {
                            waited: self.timeouts.go
                        }
                    );
                    Ok(Some(self.finish(Phase2Outcome::GoTimeout)))
                }
            }
            CycleState::AwaitPhase2Rows => {
                let first = Phase::second(&self.config).first_loaded_row();
                match self.receive_rows(first, self.config.phase2_rows())? {
                    Ok(()) => {
                        self.state = CycleState::ProcessPhase2;
                        Ok(None)
                    }
                    Err(row) => {
                        warn!("Phase 2 row {} timed out, aborting phase 2", row);
                        Ok(Some(self.finish(Phase2Outcome::RowTimeout { row })))
                    }
                }
            }
            CycleState::ProcessPhase2 => {
                let emitted = self.emit_phase(Phase::second(&self.config))?;
                self.report.rows_emitted += emitted;
                Ok(Some(self.finish(Phase2Outcome::Completed)))
            }
        }
    }

    fn finish(&mut self, phase2: Phase2Outcome) -> CycleReport {
        self.report.phase2 = phase2;
        self.state = CycleState::AwaitPhase1Rows;
        info!(
            "Cycle {} finished: {} rows emitted, phase 2 {:?}",
            self.cycle, self.report.rows_emitted, phase2
        );
        self.report.clone()
    }

    /// Fill buffer rows `0..count` with global rows `first..first + count`.
    ///
    /// The inner `Err` carries the global row that timed out. Reception stops
    /// there and a diagnostic line goes to the peer.
    fn receive_rows(&mut self, first: usize, count: usize) -> AppResult<Result<(), usize>> {
        for local in 0..count {
            let global = first + local;
            let received = self.codec.receive_row(
                &mut self.transport,
                global,
                self.buffer.row_mut(local),
                self.timeouts.row,
            );

            match received {
                Ok(()) => {}
                Err(err @ KuwaharaError::RowTimeout { .. }) => {
                    self.transport.send(format!("ERROR: {}\n", err).as_bytes())?;
                    return Ok(Err(global));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(Ok(()))
    }

    /// Filter and send every row of `phase`, each as soon as it is computed.
    fn emit_phase(&mut self, phase: Phase) -> AppResult<usize> {
        debug!("Processing rows {:?}", phase.rows());
        let view = RollingView::new(&self.buffer, phase, self.config.image_size);

        let mut emitted = 0;
        for y in phase.rows() {
            self.filter.filter_row(&view, y, &mut self.scratch);
            let line = self.codec.encode_row(&self.scratch);
            self.transport.send(line.as_bytes())?;
            emitted += 1;
        }
        Ok(emitted)
    }

    /// Step until the current cycle finishes.
    pub fn run_cycle(&mut self) -> AppResult<CycleReport> {
        loop {
            if let Some(report) = self.step()? {
                return Ok(report);
            }
        }
    }

    /// Run cycles back to back.
    ///
    /// Recoverable errors are logged and the next cycle starts over at phase
    /// 1 after the restart pause, so a dead link does not spin the loop.
    /// `max_cycles` bounds the number of attempts; `None` runs forever.
    pub fn run(&mut self, max_cycles: Option<u64>) -> AppResult<()> {
        let mut attempts = 0;
        while max_cycles.map_or(true, |max| attempts < max) {
            attempts += 1;
            match self.run_cycle() {
                Ok(_) => {}
                Err(err) if err.is_recoverable() => {
                    error!("Cycle {} failed: {}, restarting", self.cycle, err);
                    if max_cycles.map_or(true, |max| attempts < max) {
                        thread::sleep(self.restart_pause);
                    }
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}
