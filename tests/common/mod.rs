//! Common test utilities: a simulated analyzer endpoint.
//!
//! [`SimVna`] implements the crate's [`Transport`] as a small stateful
//! device model: it parses every command line it receives, maintains sweep,
//! trace, marker, calibration, and slot state, and queues replies for
//! queries. Tests keep a cloned handle for seeding errors and inspecting
//! the write log and the resulting device state.

#![allow(dead_code)] // Utilities may not all be used by every test binary

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use vna_control::transport::Transport;
use vna_control::{Result, VnaError};

const MARKERS: usize = 16;

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    center: f64,
    span: f64,
    start: f64,
    stop: f64,
    points: u32,
    trace_count: u32,
    correction: bool,
    cal_saved: bool,
    includes_cal: bool,
}

#[derive(Debug)]
struct SimState {
    error_queue: VecDeque<(i32, String)>,
    pending: VecDeque<String>,
    writes: Vec<String>,
    center: f64,
    span: f64,
    start: f64,
    stop: f64,
    points: u32,
    trace_count: u32,
    correction: bool,
    cal_saved: bool,
    marker_on: [bool; MARKERS],
    marker_x: [f64; MARKERS],
    limit_on: bool,
    store_cal: bool,
    slots: HashMap<String, Snapshot>,
}

impl SimState {
    fn preset(&mut self) {
        self.center = 650e6;
        self.span = 1.3e9;
        self.start = 0.0;
        self.stop = 1.3e9;
        self.points = 201;
        self.trace_count = 1;
        self.correction = false;
        self.cal_saved = false;
        self.marker_on = [false; MARKERS];
        self.marker_x = [0.0; MARKERS];
        self.limit_on = false;
    }

    fn new() -> Self {
        let mut state = Self {
            error_queue: VecDeque::new(),
            pending: VecDeque::new(),
            writes: Vec::new(),
            center: 0.0,
            span: 0.0,
            start: 0.0,
            stop: 0.0,
            points: 0,
            trace_count: 0,
            correction: false,
            cal_saved: false,
            marker_on: [false; MARKERS],
            marker_x: [0.0; MARKERS],
            limit_on: false,
            store_cal: false,
            slots: HashMap::new(),
        };
        state.preset();
        state
    }

    fn reply(&mut self, text: String) {
        self.pending.push_back(text);
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            center: self.center,
            span: self.span,
            start: self.start,
            stop: self.stop,
            points: self.points,
            trace_count: self.trace_count,
            correction: self.correction,
            cal_saved: self.cal_saved,
            includes_cal: self.store_cal,
        }
    }

    fn restore(&mut self, snapshot: &Snapshot) {
        self.center = snapshot.center;
        self.span = snapshot.span;
        self.start = snapshot.start;
        self.stop = snapshot.stop;
        self.points = snapshot.points;
        self.trace_count = snapshot.trace_count;
        if snapshot.includes_cal {
            self.correction = snapshot.correction;
            self.cal_saved = snapshot.cal_saved;
        }
    }

    fn handle(&mut self, line: &str) {
        let cmd = line.trim().strip_prefix(':').unwrap_or(line.trim());

        if cmd == "*IDN?" {
            self.reply("SimVNA,BVNA-1000,00001,1.00".to_string());
        } else if cmd == "*OPC?" {
            self.reply("1".to_string());
        } else if cmd == "*RST" || cmd == "SYST:PRES" {
            self.preset();
        } else if cmd == "SYST:ERR?" {
            let entry = self
                .error_queue
                .pop_front()
                .unwrap_or((0, "No error".to_string()));
            self.reply(format!("{},\"{}\"", entry.0, entry.1));
        } else if let Some(rest) = cmd.strip_prefix("SENS1:FREQ:") {
            self.handle_frequency(rest);
        } else if let Some(rest) = cmd.strip_prefix("SENS1:SWE:POIN") {
            match rest.trim() {
                "?" => {
                    let points = self.points;
                    self.reply(points.to_string());
                }
                arg => self.points = arg.trim().parse().unwrap_or(self.points),
            }
        } else if let Some(rest) = cmd.strip_prefix("CALC1:PAR:COUN") {
            match rest.trim() {
                "?" => {
                    let count = self.trace_count;
                    self.reply(count.to_string());
                }
                arg => self.trace_count = arg.trim().parse().unwrap_or(self.trace_count),
            }
        } else if let Some(rest) = cmd.strip_prefix("CALC1:MARK") {
            self.handle_marker(rest);
        } else if cmd == "SENS1:CORR:COLL:SAVE" {
            self.cal_saved = true;
        } else if let Some(arg) = cmd.strip_prefix("SENS1:CORR:STAT ") {
            self.correction = arg.trim() == "1";
        } else if cmd == "CALC1:LIM 1" {
            self.limit_on = true;
        } else if cmd == "CALC1:LIM 0" {
            self.limit_on = false;
        } else if cmd == "CALC1:LIM:FAIL?" {
            self.reply(if self.limit_on { "1" } else { "0" }.to_string());
        } else if let Some(arg) = cmd.strip_prefix("MMEM:STOR:STYP ") {
            self.store_cal = arg.trim() == "CST";
        } else if let Some(arg) = cmd.strip_prefix("MMEM:STOR ") {
            let snapshot = self.snapshot();
            self.slots.insert(arg.trim().to_string(), snapshot);
        } else if let Some(arg) = cmd.strip_prefix("MMEM:LOAD ") {
            match self.slots.get(arg.trim()).cloned() {
                Some(snapshot) => self.restore(&snapshot),
                None => self
                    .error_queue
                    .push_back((-256, "File name not found".to_string())),
            }
        }
        // Everything else (trace binding, display, collection captures,
        // limit table entries) is accepted silently, like the real parser.
    }

    fn handle_frequency(&mut self, rest: &str) {
        let (field, arg) = match rest.split_once([' ', '?']) {
            Some((field, arg)) => (field, arg),
            None => return,
        };
        let is_query = rest.contains('?');
        match (field, is_query) {
            ("CENT", true) => {
                let v = self.center;
                self.reply(format!("{v:E}"));
            }
            ("SPAN", true) => {
                let v = self.span;
                self.reply(format!("{v:E}"));
            }
            ("STAR", true) => {
                let v = self.start;
                self.reply(format!("{v:E}"));
            }
            ("STOP", true) => {
                let v = self.stop;
                self.reply(format!("{v:E}"));
            }
            ("CENT", false) => self.center = arg.trim().parse().unwrap_or(self.center),
            ("SPAN", false) => self.span = arg.trim().parse().unwrap_or(self.span),
            ("STAR", false) => self.start = arg.trim().parse().unwrap_or(self.start),
            ("STOP", false) => self.stop = arg.trim().parse().unwrap_or(self.stop),
            _ => {}
        }
    }

    fn handle_marker(&mut self, rest: &str) {
        // rest looks like "1?", "1 1", "1:X 423000000", "2:FUNC:EXEC", ...
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        let index: usize = match digits.parse::<usize>() {
            Ok(i) if (1..=MARKERS).contains(&i) => i - 1,
            _ => return,
        };
        let tail = &rest[digits.len()..];
        match tail.trim() {
            "?" => {
                let on = self.marker_on[index];
                self.reply(if on { "1" } else { "0" }.to_string());
            }
            "1" => self.marker_on[index] = true,
            "0" => self.marker_on[index] = false,
            ":X?" => {
                let x = self.marker_x[index];
                self.reply(format!("{x:E}"));
            }
            ":Y?" => self.reply("-10.5,0".to_string()),
            other => {
                if let Some(arg) = other.strip_prefix(":X ") {
                    self.marker_x[index] = arg.trim().parse().unwrap_or(0.0);
                }
                // FUNC:TYPE / FUNC:TARG / FUNC:EXEC leave the position where
                // the test put it.
            }
        }
    }
}

/// Shared-state simulated analyzer.
#[derive(Clone)]
pub struct SimVna {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimVna {
    fn default() -> Self {
        Self::new()
    }
}

impl SimVna {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a stale error, as left behind by a prior client.
    pub fn seed_error(&self, code: i32, message: &str) {
        self.lock().error_queue.push_back((code, message.to_string()));
    }

    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.lock().writes.clear();
    }

    /// Current sweep as (center, span, points).
    pub fn sweep(&self) -> (f64, f64, u32) {
        let state = self.lock();
        (state.center, state.span, state.points)
    }

    pub fn correction_enabled(&self) -> bool {
        self.lock().correction
    }

    pub fn cal_saved(&self) -> bool {
        self.lock().cal_saved
    }
}

#[async_trait]
impl Transport for SimVna {
    async fn write_line(&mut self, line: &str) -> Result<()> {
        let mut state = self.lock();
        state.writes.push(line.to_string());
        state.handle(line);
        Ok(())
    }

    async fn read_line(&mut self, _timeout: Duration) -> Result<String> {
        self.lock().pending.pop_front().ok_or_else(|| {
            VnaError::Protocol("simulated device has no reply queued".to_string())
        })
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}
