//! Field-bus manager: frame model, bounded RX queue, command dispatch
//! and periodic telemetry.
//!
//! The bus speaks a fixed set of CAN-style message ids (11-bit range in
//! practice).  Outbound status frames are built from live reads of the
//! control components; inbound command frames mutate the PID controller
//! and the actuators.  Everything runs on the logical tick — there is no
//! wall-clock time and `receive_frame` never blocks.

pub mod codec;

use heapless::{Deque, Vec};
use log::{debug, info, trace, warn};

use crate::control::pid::PidController;
use crate::drivers::actuator::{Actuator, ActuatorStatus};
use crate::error::BusError;
use crate::sensors::temperature::{TempReading, TemperatureSensor};

// ---------------------------------------------------------------------------
// Message ids
// ---------------------------------------------------------------------------

pub const MSG_TEMP_STATUS: u32 = 0x100;
pub const MSG_PUMP_STATUS: u32 = 0x101;
pub const MSG_FAN_STATUS: u32 = 0x102;
pub const MSG_SYSTEM_STATUS: u32 = 0x103;
pub const MSG_PID_PARAMS: u32 = 0x104;
/// Reserved for a dedicated ignition-status frame (no sender yet).
pub const MSG_IGNITION_STATUS: u32 = 0x105;
/// Reserved for a dedicated coolant-level frame (no sender yet).
pub const MSG_COOLANT_LEVEL: u32 = 0x106;
pub const MSG_SETPOINT_CMD: u32 = 0x200;
pub const MSG_PID_TUNE_CMD: u32 = 0x201;
pub const MSG_SYSTEM_CMD: u32 = 0x202;

/// System-command opcodes carried in the first payload byte of
/// [`MSG_SYSTEM_CMD`].
pub const SYS_CMD_RESET: u8 = 0x01;
pub const SYS_CMD_EMERGENCY_STOP: u8 = 0x02;
pub const SYS_CMD_ENABLE: u8 = 0x03;

/// Maximum frame payload length.
pub const MAX_PAYLOAD: usize = 8;
/// Bounded inbound queue capacity.
pub const RX_QUEUE_CAPACITY: usize = 32;

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// A single bus message.
///
/// The payload is a fixed-capacity vector of at most 8 bytes; oversize
/// payloads are rejected at construction, so a frame with more than 8
/// bytes is unrepresentable past this boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub id: u32,
    pub payload: Vec<u8, MAX_PAYLOAD>,
    pub extended: bool,
    pub remote: bool,
}

impl Frame {
    /// Build a standard data frame.  Fails with
    /// [`BusError::FrameTooLong`] when the payload exceeds 8 bytes.
    pub fn new(id: u32, payload: &[u8]) -> Result<Self, BusError> {
        let payload = Vec::from_slice(payload).map_err(|()| BusError::FrameTooLong)?;
        Ok(Self {
            id,
            payload,
            extended: false,
            remote: false,
        })
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Config / stats
// ---------------------------------------------------------------------------

/// Bus configuration; currently just the baud rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    pub baudrate: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { baudrate: 250_000 }
    }
}

/// Monotonically non-decreasing traffic counters, reset only by
/// (re-)initialisation.  `error_count` and `bus_off_count` are part of
/// the stats record's wire-facing shape but nothing increments them:
/// bus-error recovery is out of scope for this controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    pub tx_count: u32,
    pub rx_count: u32,
    pub error_count: u32,
    pub bus_off_count: u32,
}

/// Inbound-frame observer invoked after command dispatch.
pub type RxCallback = Box<dyn FnMut(&Frame)>;

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Field-bus manager.
pub struct BusManager {
    config: BusConfig,
    stats: BusStats,
    rx_queue: Deque<Frame, RX_QUEUE_CAPACITY>,
    rx_callback: Option<RxCallback>,
    /// Logical tick increment applied by each `periodic_send` call (ms).
    tick_interval_ms: u32,
    /// Telemetry emission interval (ms of logical time).
    tx_interval_ms: u32,
    time_ms: u32,
    last_tx_ms: u32,
}

impl BusManager {
    pub fn new(tick_interval_ms: u32, tx_interval_ms: u32) -> Self {
        let mut bus = Self {
            config: BusConfig::default(),
            stats: BusStats::default(),
            rx_queue: Deque::new(),
            rx_callback: None,
            tick_interval_ms,
            tx_interval_ms,
            time_ms: 0,
            last_tx_ms: 0,
        };
        bus.init(None);
        bus
    }

    /// (Re-)initialise the bus.  `None` adopts the default 250 kbit/s
    /// configuration.  Stats, the RX queue and the telemetry clock are
    /// reset, and the default RX trace callback is registered.
    pub fn init(&mut self, config: Option<BusConfig>) {
        self.config = config.unwrap_or_default();
        self.stats = BusStats::default();
        self.rx_queue.clear();
        self.time_ms = 0;
        self.last_tx_ms = 0;
        self.rx_callback = Some(Box::new(|frame: &Frame| {
            trace!("bus rx observer: id=0x{:03X} len={}", frame.id, frame.len());
        }));
        info!("bus initialized at {} bit/s", self.config.baudrate);
    }

    pub fn config(&self) -> BusConfig {
        self.config
    }

    /// Read-only stats snapshot.
    pub fn stats(&self) -> &BusStats {
        &self.stats
    }

    /// Transmit a frame.  The simulated transceiver just traces the
    /// frame; the tx counter advances on success.
    pub fn send_frame(&mut self, frame: &Frame) -> Result<(), BusError> {
        if frame.len() > MAX_PAYLOAD {
            return Err(BusError::FrameTooLong);
        }

        trace!(
            "bus tx: id=0x{:03X} len={} data={:02X?}",
            frame.id,
            frame.len(),
            frame.payload.as_slice()
        );
        self.stats.tx_count += 1;

        Ok(())
    }

    /// Dequeue the oldest inbound frame.  An empty queue yields
    /// [`BusError::Timeout`], which is the expected idle outcome, not a
    /// failure.
    pub fn receive_frame(&mut self) -> Result<Frame, BusError> {
        match self.rx_queue.pop_front() {
            Some(frame) => {
                self.stats.rx_count += 1;
                Ok(frame)
            }
            None => Err(BusError::Timeout),
        }
    }

    /// Ingress path: append an inbound frame to the bounded queue.
    /// A full queue drops the new frame (`QueueFull`); queued frames and
    /// counters are untouched.
    pub fn inject_rx_frame(&mut self, frame: Frame) -> Result<(), BusError> {
        self.rx_queue.push_back(frame).map_err(|_| BusError::QueueFull)
    }

    /// Replace the inbound-frame observer; `None` clears it.
    pub fn set_rx_callback(&mut self, callback: Option<RxCallback>) {
        self.rx_callback = callback;
    }

    /// Drain the RX queue and dispatch each frame to its command
    /// handler, then to the registered observer.  Malformed frames
    /// (shorter than the command requires) are logged and ignored.
    pub fn process_messages(
        &mut self,
        pid: &mut PidController,
        pump: &mut Actuator,
        fan: &mut Actuator,
    ) {
        loop {
            let frame = match self.receive_frame() {
                Ok(frame) => frame,
                Err(_) => break,
            };

            debug!(
                "bus rx: id=0x{:03X} len={} data={:02X?}",
                frame.id,
                frame.len(),
                frame.payload.as_slice()
            );

            match frame.id {
                MSG_SETPOINT_CMD => handle_setpoint_cmd(&frame, pid),
                MSG_PID_TUNE_CMD => handle_pid_tune_cmd(&frame, pid),
                MSG_SYSTEM_CMD => handle_system_cmd(&frame, pid, pump, fan),
                _ => {}
            }

            if let Some(callback) = &mut self.rx_callback {
                callback(&frame);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Outbound status frames
    // -----------------------------------------------------------------------

    pub fn send_temp_status(&mut self, reading: TempReading) -> Result<(), BusError> {
        let mut data = [0u8; 5];
        data[0..4].copy_from_slice(&codec::float_to_bytes(reading.celsius));
        data[4] = reading.status.code();
        self.send_frame(&Frame::new(MSG_TEMP_STATUS, &data)?)
    }

    /// Pump and fan share one layout; only the message id differs.
    pub fn send_actuator_status(
        &mut self,
        msg_id: u32,
        status: ActuatorStatus,
    ) -> Result<(), BusError> {
        let mut data = [0u8; 6];
        data[0..4].copy_from_slice(&codec::float_to_bytes(status.duty_cycle));
        data[4] = status.mode.code();
        data[5] = u8::from(status.enabled);
        self.send_frame(&Frame::new(msg_id, &data)?)
    }

    pub fn send_system_status(
        &mut self,
        state_code: u8,
        ignition_code: u8,
        coolant_code: u8,
        fault_byte: u8,
    ) -> Result<(), BusError> {
        let data = [state_code, ignition_code, coolant_code, fault_byte];
        self.send_frame(&Frame::new(MSG_SYSTEM_STATUS, &data)?)
    }

    pub fn send_pid_params(&mut self, pid: &PidController) -> Result<(), BusError> {
        let (kp, ki, kd) = pid.gains();
        let mut data = [0u8; 8];
        data[0..2].copy_from_slice(&codec::encode_gain(kp).to_le_bytes());
        data[2..4].copy_from_slice(&codec::encode_gain(ki).to_le_bytes());
        data[4..6].copy_from_slice(&codec::encode_gain(kd).to_le_bytes());
        data[6..8].copy_from_slice(&codec::encode_setpoint(pid.setpoint()).to_le_bytes());
        self.send_frame(&Frame::new(MSG_PID_PARAMS, &data)?)
    }

    /// Advance the logical telemetry clock by one tick and, when the
    /// transmit interval has elapsed, emit the full status set in order:
    /// temperature, PID parameters, pump status, fan status.  Each frame
    /// is built from a live read of its component.
    pub fn periodic_send(
        &mut self,
        temp_sensor: &mut TemperatureSensor,
        pid: &PidController,
        pump: &Actuator,
        fan: &Actuator,
    ) -> Result<(), BusError> {
        self.time_ms += self.tick_interval_ms;
        if self.time_ms - self.last_tx_ms < self.tx_interval_ms {
            return Ok(());
        }
        self.last_tx_ms = self.time_ms;

        let reading = temp_sensor.read();
        self.send_temp_status(reading)?;
        self.send_pid_params(pid)?;
        self.send_actuator_status(MSG_PUMP_STATUS, pump.status())?;
        self.send_actuator_status(MSG_FAN_STATUS, fan.status())?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Inbound command handlers
// ---------------------------------------------------------------------------

fn handle_setpoint_cmd(frame: &Frame, pid: &mut PidController) {
    let Some(bytes) = frame.payload.get(0..4) else {
        debug!("setpoint command too short ({} bytes), ignored", frame.len());
        return;
    };
    let setpoint = codec::bytes_to_float(&[bytes[0], bytes[1], bytes[2], bytes[3]]);
    pid.set_setpoint(setpoint);
    info!("bus command: setpoint -> {setpoint:.1}");
}

fn handle_pid_tune_cmd(frame: &Frame, pid: &mut PidController) {
    if frame.len() < 8 {
        debug!("PID tune command too short ({} bytes), ignored", frame.len());
        return;
    }
    let kp = codec::decode_gain(codec::u16_from_le(&frame.payload[0..2]));
    let ki = codec::decode_gain(codec::u16_from_le(&frame.payload[2..4]));
    let kd = codec::decode_gain(codec::u16_from_le(&frame.payload[4..6]));
    pid.set_gains(kp, ki, kd);
    info!("bus command: gains -> kp={kp:.3} ki={ki:.3} kd={kd:.3}");
}

fn handle_system_cmd(
    frame: &Frame,
    pid: &mut PidController,
    pump: &mut Actuator,
    fan: &mut Actuator,
) {
    let Some(&command) = frame.payload.first() else {
        debug!("system command with empty payload, ignored");
        return;
    };

    match command {
        SYS_CMD_RESET => {
            info!("bus command: controller reset");
            pid.reset();
        }
        SYS_CMD_EMERGENCY_STOP => {
            warn!("bus command: emergency stop");
            pump.enable(false);
            fan.enable(false);
        }
        SYS_CMD_ENABLE => {
            info!("bus command: actuators enabled");
            pump.enable(true);
            fan.enable(true);
        }
        other => {
            warn!("bus command: unknown opcode 0x{other:02X}, ignored");
        }
    }
}
