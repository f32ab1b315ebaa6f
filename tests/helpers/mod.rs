/// Test doubles simulating the CAN engines, board, storage and timer during
/// integration tests.
use multibus_can::controller::BusTopology;
use multibus_can::core::MAX_BUSSES;
use multibus_can::platform::board::{ActivityIndicator, Board};
use multibus_can::platform::bridge::BridgeHook;
use multibus_can::platform::storage::SettingsStorage;
use multibus_can::settings::SettingsRecord;
use multibus_can::transport::frame::{RawMessage, ID_EFF};
use multibus_can::transport::traits::bus_timer::BusTimer;
use multibus_can::transport::traits::can_driver::{BusStatistics, CanDriver, DriverEvent};
use multibus_can::CanController;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};

#[allow(dead_code)]
pub type TestController = CanController<MockDriver, MockBoard, MemoryStorage, MockTimer>;

#[allow(dead_code)]
/// Pins 4..9 on three engines; the last bus has no transceiver power pin.
pub const TOPOLOGY: [BusTopology; MAX_BUSSES] = [
    BusTopology::new(4, 5, 0, 15).with_power_pin(20),
    BusTopology::new(6, 7, 1, 16).with_power_pin(21),
    BusTopology::new(8, 9, 2, 17),
];

//==================================================================================DRIVER
#[derive(Default)]
#[allow(dead_code)]
/// Everything a `MockDriver` was asked to do, plus the state it simulates.
pub struct DriverLog {
    pub setups: Vec<u8>,
    pub starts: Vec<(u32, u8, u8)>,
    pub stops: usize,
    pub transmitted: Vec<RawMessage>,
    /// Frames "on the wire", delivered on the next service.
    pub pending_rx: VecDeque<RawMessage>,
    /// Transmit slot occupied until the next service.
    pub busy: bool,
    pub services: usize,
    pub fail_transmit: bool,
    pub stats: BusStatistics,
}

#[derive(Clone, Default)]
#[allow(dead_code)]
/// In-memory CAN engine reproducing the `CanDriver` contract.
pub struct MockDriver {
    pub log: Arc<Mutex<DriverLog>>,
}

#[allow(dead_code)]
impl MockDriver {
    /// Put a standard data frame on the wire, to be picked up by the next service.
    pub fn inject(&self, id: u32, data: &[u8]) {
        let mut raw = RawMessage {
            id,
            dlc: data.len() as u32,
            data: [0; 8],
        };
        raw.data[..data.len()].copy_from_slice(data);
        self.log.lock().unwrap().pending_rx.push_back(raw);
    }

    /// Same as [`inject`](Self::inject) with a 29-bit identifier.
    pub fn inject_extended(&self, id: u32, data: &[u8]) {
        self.inject(id | ID_EFF, data);
    }

    pub fn transmitted(&self) -> Vec<RawMessage> {
        self.log.lock().unwrap().transmitted.clone()
    }
}

impl CanDriver for MockDriver {
    type Error = ();

    fn setup(&mut self, engine: u8) {
        self.log.lock().unwrap().setups.push(engine);
    }

    fn start(&mut self, bitrate: u32, pin_rx: u8, pin_tx: u8) {
        self.log.lock().unwrap().starts.push((bitrate, pin_rx, pin_tx));
    }

    fn stop(&mut self) {
        self.log.lock().unwrap().stops += 1;
    }

    fn check_transmit(&self) -> bool {
        !self.log.lock().unwrap().busy
    }

    fn transmit(&mut self, msg: &RawMessage) -> Result<(), Self::Error> {
        let mut log = self.log.lock().unwrap();
        log.stats.tx_attempt += 1;
        if log.fail_transmit {
            return Err(());
        }
        log.transmitted.push(*msg);
        log.stats.tx_total += 1;
        Ok(())
    }

    fn service_pending<F: FnMut(DriverEvent<'_>)>(&mut self, mut notify: F) {
        let received: Vec<RawMessage> = {
            let mut log = self.log.lock().unwrap();
            log.services += 1;
            log.busy = false;
            log.stats.rx_total += log.pending_rx.len() as u32;
            log.pending_rx.drain(..).collect()
        };
        for msg in &received {
            notify(DriverEvent::Received(msg));
        }
    }

    fn statistics(&self) -> BusStatistics {
        self.log.lock().unwrap().stats
    }
}

//==================================================================================BOARD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum BoardCall {
    InitPowerPin(u8),
    SetPowerPin(u8, bool),
    ClaimEngine(u8),
    IrqEnabled(u16, bool),
    IrqPriority(u16, u8),
    RouteIrq { engine: u8, irq: u16, core: u8 },
    WatchdogArmed,
}

#[derive(Clone, Default)]
#[allow(dead_code)]
/// Board recording every call in order.
pub struct MockBoard {
    pub calls: Arc<Mutex<Vec<BoardCall>>>,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn calls(&self) -> Vec<BoardCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: BoardCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Board for MockBoard {
    fn init_power_pin(&mut self, pin: u8) {
        self.record(BoardCall::InitPowerPin(pin));
    }

    fn set_power_pin(&mut self, pin: u8, on: bool) {
        self.record(BoardCall::SetPowerPin(pin, on));
    }

    fn claim_engine(&mut self, engine: u8) {
        self.record(BoardCall::ClaimEngine(engine));
    }

    fn set_irq_enabled(&mut self, irq: u16, enabled: bool) {
        self.record(BoardCall::IrqEnabled(irq, enabled));
    }

    fn set_irq_priority(&mut self, irq: u16, priority: u8) {
        self.record(BoardCall::IrqPriority(irq, priority));
    }

    fn route_irq_to_core(&mut self, engine: u8, irq: u16, core: u8) {
        self.record(BoardCall::RouteIrq { engine, irq, core });
    }

    fn arm_watchdog_reset(&mut self) {
        self.record(BoardCall::WatchdogArmed);
    }
}

//==================================================================================STORAGE
#[derive(Default)]
#[allow(dead_code)]
pub struct StorageState {
    pub blob: Option<Vec<u8>>,
    pub writes: usize,
}

#[derive(Clone, Default)]
#[allow(dead_code)]
/// Single-blob storage living in RAM.
pub struct MemoryStorage {
    pub state: Arc<Mutex<StorageState>>,
}

#[allow(dead_code)]
impl MemoryStorage {
    pub fn with_record(record: &SettingsRecord) -> Self {
        let storage = Self::default();
        storage.state.lock().unwrap().blob = Some(record.to_bytes().to_vec());
        storage
    }

    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    /// Decode the blob currently stored.
    pub fn stored(&self) -> Option<SettingsRecord> {
        let state = self.state.lock().unwrap();
        let blob = state.blob.as_ref()?;
        let bytes = blob.as_slice().try_into().ok()?;
        Some(SettingsRecord::from_bytes(bytes))
    }
}

impl SettingsStorage for MemoryStorage {
    type Error = ();

    async fn read<'a>(&'a mut self, _name: &'a str, buf: &'a mut [u8]) -> Result<usize, ()> {
        let state = self.state.lock().unwrap();
        let blob = state.blob.as_ref().ok_or(())?;
        let len = blob.len().min(buf.len());
        buf[..len].copy_from_slice(&blob[..len]);
        Ok(len)
    }

    async fn write<'a>(&'a mut self, _name: &'a str, data: &'a [u8]) -> Result<(), ()> {
        let mut state = self.state.lock().unwrap();
        state.blob = Some(data.to_vec());
        state.writes += 1;
        Ok(())
    }
}

//==================================================================================TIMER
#[allow(dead_code)]
/// Timer based on `tokio::time::sleep` to drive delays in tests.
pub struct MockTimer;

impl BusTimer for MockTimer {
    async fn delay_ms(&self, millis: u32) {
        sleep(Duration::from_millis(millis as u64)).await;
    }
}

//==================================================================================HOOKS
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct MockBridge {
    pub calls: Arc<Mutex<Vec<(u8, u8)>>>,
}

impl BridgeHook for MockBridge {
    fn set_bridge(&mut self, bus_a: u8, bus_b: u8) {
        self.calls.lock().unwrap().push((bus_a, bus_b));
    }
}

#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct MockIndicator {
    pub blinks: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockIndicator {
    pub fn blinks(&self) -> usize {
        self.blinks.load(Ordering::SeqCst)
    }
}

impl ActivityIndicator for MockIndicator {
    fn blink(&mut self) {
        self.blinks.fetch_add(1, Ordering::SeqCst);
    }
}

//==================================================================================RIG
#[allow(dead_code)]
/// Controller wired to mocks, with handles on every mock.
pub struct Rig {
    pub controller: TestController,
    pub drivers: [MockDriver; MAX_BUSSES],
    pub board: MockBoard,
    pub storage: MemoryStorage,
}

#[allow(dead_code)]
impl Rig {
    /// Controller whose storage starts with `stored`, or empty.
    pub fn new(stored: Option<SettingsRecord>) -> Self {
        let drivers: [MockDriver; MAX_BUSSES] = Default::default();
        let board = MockBoard::default();
        let storage = stored
            .as_ref()
            .map(MemoryStorage::with_record)
            .unwrap_or_default();

        let controller = CanController::new(
            TOPOLOGY,
            drivers.clone(),
            board.clone(),
            storage.clone(),
            MockTimer,
        );

        Self {
            controller,
            drivers,
            board,
            storage,
        }
    }

    /// Controller with `num_busses` active buses loaded from storage, all
    /// disabled. Nothing is brought up.
    pub async fn loaded(num_busses: u8) -> Self {
        let mut record = SettingsRecord::new();
        record.num_busses = num_busses;
        let rig = Self::new(Some(record));
        rig.controller
            .load_settings(&mut MockBridge::default())
            .await
            .expect("stored record must load");
        rig
    }
}
