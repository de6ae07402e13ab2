//! Shared harness for the integration suite: an in-memory store and
//! recording implementations of every collaborator contract.

use async_trait::async_trait;
use entity_key::EntityKey;
use rule_engine::{
    box_name_of, rule_name_of, ActionSink, ActionTask, BoxEntity, BrokerError, Cell,
    CellLockManager, CellStatus, EngineConfig, EntityStore, Event, EventPublisher,
    EventSubscriber, RuleEngine, RuleEntity, StoreError, TimerEventSink, TimerRuleSpec,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{mpsc, Mutex as TokioMutex};

pub const UNIT_URL: &str = "http://unit.example/";

/// A cell rooted under the shared unit URL.
pub fn cell(id: &str) -> Cell {
    Cell {
        id: id.to_string(),
        name: id.to_string(),
        url: format!("{UNIT_URL}{id}/"),
        unit_url: UNIT_URL.to_string(),
    }
}

#[derive(Default)]
struct StoreState {
    cells: HashMap<String, Cell>,
    rules: HashMap<String, Vec<RuleEntity>>,
    boxes: HashMap<String, Vec<BoxEntity>>,
    fail_reads: bool,
}

/// In-memory store whose rows the tests mutate out-of-band, the way the
/// real store changes underneath the engine.
#[derive(Default)]
pub struct MemoryStore {
    state: StdMutex<StoreState>,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn add_cell(&self, cell: Cell) {
        self.state.lock().unwrap().cells.insert(cell.id.clone(), cell);
    }

    pub fn remove_cell(&self, cell_id: &str) {
        self.state.lock().unwrap().cells.remove(cell_id);
    }

    pub fn set_rules(&self, cell_id: &str, rules: Vec<RuleEntity>) {
        self.state
            .lock()
            .unwrap()
            .rules
            .insert(cell_id.to_string(), rules);
    }

    pub fn add_box(&self, cell_id: &str, bx: BoxEntity) {
        self.state
            .lock()
            .unwrap()
            .boxes
            .entry(cell_id.to_string())
            .or_default()
            .push(bx);
    }

    pub fn rename_box(&self, cell_id: &str, box_id: &str, name: &str, schema: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        if let Some(boxes) = state.boxes.get_mut(cell_id) {
            if let Some(bx) = boxes.iter_mut().find(|bx| bx.id == box_id) {
                bx.name = name.to_string();
                bx.schema = schema.map(str::to_string);
            }
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get_cell(&self, cell_id: &str) -> Option<Cell> {
        self.state.lock().unwrap().cells.get(cell_id).cloned()
    }

    async fn list_cells(&self) -> Result<Vec<Cell>, StoreError> {
        Ok(self.state.lock().unwrap().cells.values().cloned().collect())
    }

    async fn list_rules(&self, cell: &Cell) -> Result<Vec<RuleEntity>, StoreError> {
        let state = self.state.lock().unwrap();
        if state.fail_reads {
            return Err(StoreError::Backend("injected failure".to_string()));
        }
        Ok(state.rules.get(&cell.id).cloned().unwrap_or_default())
    }

    async fn read_rule(&self, cell: &Cell, key: &EntityKey) -> Result<RuleEntity, StoreError> {
        let state = self.state.lock().unwrap();
        if state.fail_reads {
            return Err(StoreError::Backend("injected failure".to_string()));
        }
        let rule_name =
            rule_name_of(key).ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        let box_name = box_name_of(key);
        state
            .rules
            .get(&cell.id)
            .and_then(|rules| {
                rules
                    .iter()
                    .find(|rule| rule.name == rule_name && rule.box_name.as_deref() == box_name)
            })
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn find_box_by_name(
        &self,
        cell: &Cell,
        box_name: &str,
    ) -> Result<Option<BoxEntity>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .boxes
            .get(&cell.id)
            .and_then(|boxes| boxes.iter().find(|bx| bx.name == box_name))
            .cloned())
    }
}

/// Records every submitted action task.
#[derive(Default)]
pub struct RecordingActionSink {
    tasks: StdMutex<Vec<ActionTask>>,
}

#[allow(dead_code)]
impl RecordingActionSink {
    pub fn tasks(&self) -> Vec<ActionTask> {
        self.tasks.lock().unwrap().clone()
    }
}

impl ActionSink for RecordingActionSink {
    fn submit(&self, task: ActionTask) {
        self.tasks.lock().unwrap().push(task);
    }
}

/// Records every published event and whether the handle was closed.
#[derive(Default)]
pub struct RecordingPublisher {
    sent: StdMutex<Vec<Event>>,
    closed: AtomicBool,
}

#[allow(dead_code)]
impl RecordingPublisher {
    pub fn sent(&self) -> Vec<Event> {
        self.sent.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn send(&self, event: &Event) -> Result<(), BrokerError> {
        self.sent.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Control-topic subscription backed by a channel the tests feed.
pub struct ChannelSubscriber {
    receiver: TokioMutex<mpsc::Receiver<Event>>,
}

#[allow(dead_code)]
impl ChannelSubscriber {
    pub fn new(receiver: mpsc::Receiver<Event>) -> Self {
        Self {
            receiver: TokioMutex::new(receiver),
        }
    }
}

#[async_trait]
impl EventSubscriber for ChannelSubscriber {
    async fn recv(&self) -> Option<Event> {
        self.receiver.lock().await.recv().await
    }
}

/// Lock service with scriptable statuses and observable refcounts.
#[derive(Default)]
pub struct StaticCellLocks {
    statuses: StdMutex<HashMap<String, CellStatus>>,
    refs: StdMutex<HashMap<String, i64>>,
}

#[allow(dead_code)]
impl StaticCellLocks {
    pub fn set_status(&self, cell_id: &str, status: CellStatus) {
        self.statuses
            .lock()
            .unwrap()
            .insert(cell_id.to_string(), status);
    }

    pub fn current_refs(&self, cell_id: &str) -> i64 {
        self.refs.lock().unwrap().get(cell_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl CellLockManager for StaticCellLocks {
    async fn status(&self, cell_id: &str) -> CellStatus {
        self.statuses
            .lock()
            .unwrap()
            .get(cell_id)
            .copied()
            .unwrap_or(CellStatus::Normal)
    }

    async fn inc_ref(&self, cell_id: &str) {
        *self.refs.lock().unwrap().entry(cell_id.to_string()).or_insert(0) += 1;
    }

    async fn dec_ref(&self, cell_id: &str) {
        *self.refs.lock().unwrap().entry(cell_id.to_string()).or_insert(0) -= 1;
    }
}

/// Records timer-sink traffic.
#[derive(Default)]
pub struct RecordingTimerSink {
    registered: StdMutex<Vec<TimerRuleSpec>>,
    unregistered: StdMutex<Vec<TimerRuleSpec>>,
    shut_down: AtomicBool,
}

#[allow(dead_code)]
impl RecordingTimerSink {
    pub fn registered(&self) -> Vec<TimerRuleSpec> {
        self.registered.lock().unwrap().clone()
    }

    pub fn unregistered(&self) -> Vec<TimerRuleSpec> {
        self.unregistered.lock().unwrap().clone()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl TimerEventSink for RecordingTimerSink {
    fn register(&self, spec: TimerRuleSpec) {
        self.registered.lock().unwrap().push(spec);
    }

    fn unregister(&self, spec: TimerRuleSpec) {
        self.unregistered.lock().unwrap().push(spec);
    }

    fn timer_list(&self, cell_id: &str) -> serde_json::Value {
        let timers: Vec<serde_json::Value> = self
            .registered
            .lock()
            .unwrap()
            .iter()
            .filter(|spec| spec.cell_id == cell_id)
            .map(|spec| serde_json::json!({ "Name": spec.name }))
            .collect();
        serde_json::Value::Array(timers)
    }

    fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
    }
}

/// A started engine plus handles on every recording collaborator.
pub struct Harness {
    pub engine: Arc<RuleEngine>,
    pub store: Arc<MemoryStore>,
    pub actions: Arc<RecordingActionSink>,
    pub publisher: Arc<RecordingPublisher>,
    pub cell_locks: Arc<StaticCellLocks>,
    pub timer: Option<Arc<RecordingTimerSink>>,
    pub control_tx: mpsc::Sender<Event>,
}

#[allow(dead_code)]
pub async fn start_engine(store: Arc<MemoryStore>, config: EngineConfig) -> Harness {
    start_engine_with_timer(store, config, None).await
}

pub async fn start_engine_with_timer(
    store: Arc<MemoryStore>,
    config: EngineConfig,
    timer: Option<Arc<RecordingTimerSink>>,
) -> Harness {
    let actions = Arc::new(RecordingActionSink::default());
    let publisher = Arc::new(RecordingPublisher::default());
    let cell_locks = Arc::new(StaticCellLocks::default());
    let (control_tx, control_rx) = mpsc::channel(16);
    let subscription = Arc::new(ChannelSubscriber {
        receiver: TokioMutex::new(control_rx),
    });

    let engine = RuleEngine::start(
        config,
        store.clone(),
        cell_locks.clone(),
        actions.clone(),
        publisher.clone(),
        subscription,
        timer
            .clone()
            .map(|sink| sink as Arc<dyn TimerEventSink>),
    )
    .await
    .expect("engine should start");

    Harness {
        engine,
        store,
        actions,
        publisher,
        cell_locks,
        timer,
        control_tx,
    }
}

/// A rule entity with the given name and action and everything else unset.
#[allow(dead_code)]
pub fn rule_entity(name: &str, action: &str) -> RuleEntity {
    RuleEntity {
        name: name.to_string(),
        external: Some(false),
        action: Some(action.to_string()),
        ..Default::default()
    }
}

/// A data-plane event for one cell.
#[allow(dead_code)]
pub fn data_event(cell_id: &str, event_type: &str) -> Event {
    Event {
        cell_id: Some(cell_id.to_string()),
        external: false,
        event_type: Some(event_type.to_string()),
        ..Default::default()
    }
}

/// A control-plane event for one cell.
#[allow(dead_code)]
pub fn control_event(
    cell_id: &str,
    event_type: &str,
    object: Option<&str>,
    info: Option<&str>,
) -> Event {
    Event {
        cell_id: Some(cell_id.to_string()),
        external: false,
        event_type: Some(event_type.to_string()),
        object: object.map(str::to_string),
        info: info.map(str::to_string),
        ..Default::default()
    }
}

/// Names of the rules in a snapshot document, sorted.
#[allow(dead_code)]
pub fn snapshot_rule_names(snapshot: &serde_json::Value) -> Vec<String> {
    let mut names: Vec<String> = snapshot["rules"]
        .as_array()
        .expect("snapshot should carry a rules array")
        .iter()
        .map(|rule| rule["Name"].as_str().expect("rule should have a name").to_string())
        .collect();
    names.sort();
    names
}

/// Names of the boxes in a snapshot document, sorted.
#[allow(dead_code)]
pub fn snapshot_box_names(snapshot: &serde_json::Value) -> Vec<String> {
    let mut names: Vec<String> = snapshot["boxes"]
        .as_array()
        .expect("snapshot should carry a boxes array")
        .iter()
        .map(|bx| bx["Name"].as_str().expect("box should have a name").to_string())
        .collect();
    names.sort();
    names
}
