//! Calibration procedure sequencing.
//!
//! A [`CalibrationEngine`] drives one calibration procedure (single-port
//! SOL, two-port manual SOLT, or two-port ECal) as an explicit list of
//! steps executed in a fixed order. Step order is not negotiable for the
//! manual variants: the instrument's correction algorithm assumes all
//! port-A standards, then all port-B standards, then both thru directions.
//!
//! Capture steps have a real precondition the engine cannot verify over the
//! wire: the operator must have physically connected the named standard.
//! The engine therefore pauses at an [`OperatorGate`] before issuing each
//! capture command. A failed step halts the procedure at the last good
//! state; calling [`CalibrationEngine::run`] again retries the same step.
//! Nothing is retried automatically; a blind retry would capture whatever
//! happens to be connected.
//!
//! Saving the correction coefficients and applying them are separate
//! instrument operations, exposed as separate calls ([`run`] ends at the
//! save; [`CalibrationEngine::enable`] applies). Calibration data that was
//! saved but never enabled leaves the instrument measuring uncorrected.
//!
//! [`run`]: CalibrationEngine::run

use crate::channel::CommandChannel;
use crate::error::{Result, VnaError};
use async_trait::async_trait;
use log::info;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(10);

/// A physical calibration standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalStandard {
    Open,
    Short,
    Load,
}

impl CalStandard {
    fn mnemonic(self) -> &'static str {
        match self {
            CalStandard::Open => "OPEN",
            CalStandard::Short => "SHOR",
            CalStandard::Load => "LOAD",
        }
    }
}

impl fmt::Display for CalStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CalStandard::Open => "OPEN",
            CalStandard::Short => "SHORT",
            CalStandard::Load => "LOAD",
        };
        write!(f, "{name}")
    }
}

/// Calibration method registered with the instrument before captures begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalMethod {
    /// Full one-port SOL on the given port.
    SinglePort(u8),
    /// Full two-port SOLT across the given port pair.
    TwoPort(u8, u8),
}

/// One step of a calibration procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalStep {
    /// Select the calibration kit definition.
    SelectKit(u8),
    /// Register the calibration method and port assignment.
    SetMethod(CalMethod),
    /// Measure one standard on one port. Requires the operator to have
    /// connected that standard first.
    Capture { standard: CalStandard, port: u8 },
    /// Measure the thru path in one direction. Requires the thru standard
    /// to be connected between the two ports.
    Thru { from: u8, to: u8 },
    /// Run the electronic calibration module's composite sequence.
    ECal { port_a: u8, port_b: u8 },
    /// Commit the correction coefficients gathered so far.
    Save,
}

impl fmt::Display for CalStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalStep::SelectKit(kit) => write!(f, "select cal kit {kit}"),
            CalStep::SetMethod(CalMethod::SinglePort(p)) => {
                write!(f, "set method SOLT1 port {p}")
            }
            CalStep::SetMethod(CalMethod::TwoPort(a, b)) => {
                write!(f, "set method SOLT2 ports {a},{b}")
            }
            CalStep::Capture { standard, port } => {
                write!(f, "capture {standard} on port {port}")
            }
            CalStep::Thru { from, to } => write!(f, "capture THRU {from}->{to}"),
            CalStep::ECal { port_a, port_b } => {
                write!(f, "electronic calibration ports {port_a},{port_b}")
            }
            CalStep::Save => write!(f, "save correction coefficients"),
        }
    }
}

/// Where a procedure stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalState {
    Idle,
    InProgress,
    Completed,
    Aborted,
}

/// Pause point between a capture step's precondition and its command.
///
/// There is no way to detect over the wire whether the right standard is
/// connected, so the engine blocks on this hook before every capture. The
/// gate's outcome decides whether the step is issued at all.
#[async_trait]
pub trait OperatorGate: Send + Sync {
    async fn confirm(&self, prompt: &str) -> Result<()>;
}

/// Gate that always proceeds. For unattended runs against fixtures that are
/// already wired, and for tests.
pub struct AutoConfirm;

#[async_trait]
impl OperatorGate for AutoConfirm {
    async fn confirm(&self, _prompt: &str) -> Result<()> {
        Ok(())
    }
}

/// Blocking console gate: prints the prompt and waits for ENTER.
pub struct ConsolePrompt;

#[async_trait]
impl OperatorGate for ConsolePrompt {
    async fn confirm(&self, prompt: &str) -> Result<()> {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || {
            println!("{prompt}");
            println!("Press ENTER to continue.");
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| ())
        })
        .await
        .map_err(|e| VnaError::Protocol(format!("operator prompt task failed: {e}")))??;
        Ok(())
    }
}

struct PlannedStep {
    step: CalStep,
    prompt: Option<String>,
}

/// Resumable calibration procedure state machine.
pub struct CalibrationEngine {
    channel: CommandChannel,
    channel_no: u8,
    gate: Arc<dyn OperatorGate>,
    plan: Vec<PlannedStep>,
    cursor: usize,
    state: CalState,
    step_timeout: Duration,
    settle: Duration,
}

impl CalibrationEngine {
    /// Single-port SOL: open, short, load on `port`, then save.
    pub fn single_port(
        channel: CommandChannel,
        channel_no: u8,
        port: u8,
        gate: Arc<dyn OperatorGate>,
    ) -> Self {
        let mut plan = vec![PlannedStep {
            step: CalStep::SetMethod(CalMethod::SinglePort(port)),
            prompt: None,
        }];
        plan.extend(standard_captures(port));
        plan.push(PlannedStep {
            step: CalStep::Save,
            prompt: None,
        });
        Self::with_plan(channel, channel_no, gate, plan)
    }

    /// Two-port manual SOLT: all standards on `port_a`, then all on
    /// `port_b`, then the thru path in both directions, then save.
    pub fn two_port_manual(
        channel: CommandChannel,
        channel_no: u8,
        port_a: u8,
        port_b: u8,
        gate: Arc<dyn OperatorGate>,
    ) -> Self {
        let mut plan = vec![PlannedStep {
            step: CalStep::SetMethod(CalMethod::TwoPort(port_a, port_b)),
            prompt: None,
        }];
        plan.extend(standard_captures(port_a));
        plan.extend(standard_captures(port_b));
        plan.push(PlannedStep {
            step: CalStep::Thru {
                from: port_a,
                to: port_b,
            },
            prompt: Some(format!(
                "Connect the THRU standard between port {port_a} and port {port_b}."
            )),
        });
        // Same physical connection measured in the reverse direction, so no
        // second prompt.
        plan.push(PlannedStep {
            step: CalStep::Thru {
                from: port_b,
                to: port_a,
            },
            prompt: None,
        });
        plan.push(PlannedStep {
            step: CalStep::Save,
            prompt: None,
        });
        Self::with_plan(channel, channel_no, gate, plan)
    }

    /// Two-port electronic calibration: one composite command the module
    /// sequences internally, then save.
    ///
    /// `settle` is slept before the completion poll: the run lasts several
    /// seconds and scales with port count and sweep settings, so the right
    /// value is configuration-dependent.
    pub fn two_port_ecal(
        channel: CommandChannel,
        channel_no: u8,
        port_a: u8,
        port_b: u8,
        gate: Arc<dyn OperatorGate>,
        settle: Duration,
    ) -> Self {
        let plan = vec![
            PlannedStep {
                step: CalStep::ECal { port_a, port_b },
                prompt: Some(format!(
                    "Connect ports {port_a} and {port_b} to the ECal module."
                )),
            },
            PlannedStep {
                step: CalStep::Save,
                prompt: None,
            },
        ];
        let mut engine = Self::with_plan(channel, channel_no, gate, plan);
        engine.settle = settle;
        engine
    }

    fn with_plan(
        channel: CommandChannel,
        channel_no: u8,
        gate: Arc<dyn OperatorGate>,
        plan: Vec<PlannedStep>,
    ) -> Self {
        Self {
            channel,
            channel_no,
            gate,
            plan,
            cursor: 0,
            state: CalState::Idle,
            step_timeout: DEFAULT_STEP_TIMEOUT,
            settle: Duration::ZERO,
        }
    }

    /// Select a calibration kit definition before the method is set.
    pub fn with_cal_kit(mut self, kit: u8) -> Self {
        self.plan.insert(
            0,
            PlannedStep {
                step: CalStep::SelectKit(kit),
                prompt: None,
            },
        );
        self
    }

    /// Per-step completion-wait budget.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Settle delay applied before each completion poll.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Where the procedure stands.
    pub fn state(&self) -> CalState {
        self.state
    }

    /// The step that will execute next, if any.
    pub fn pending_step(&self) -> Option<&CalStep> {
        self.plan.get(self.cursor).map(|planned| &planned.step)
    }

    /// Abandon the procedure. The instrument keeps whatever captures it has
    /// already taken; only this engine refuses further steps.
    pub fn abort(&mut self) {
        if self.state != CalState::Completed {
            self.state = CalState::Aborted;
        }
    }

    /// Execute the remaining steps in order, through the save.
    ///
    /// On a step failure the procedure halts with
    /// [`VnaError::CalibrationStepFailed`] and the cursor stays on the
    /// failed step; calling `run` again retries that step, not the whole
    /// procedure. The caller decides whether retrying is safe, typically
    /// after re-confirming the physical connection.
    ///
    /// Corrections are not applied here: call [`enable`](Self::enable)
    /// afterwards.
    pub async fn run(&mut self) -> Result<()> {
        match self.state {
            CalState::Completed => {
                return Err(VnaError::Precondition(
                    "calibration procedure already completed".to_string(),
                ))
            }
            CalState::Aborted => {
                return Err(VnaError::Precondition(
                    "calibration procedure was aborted".to_string(),
                ))
            }
            CalState::Idle | CalState::InProgress => {}
        }
        self.state = CalState::InProgress;

        while self.cursor < self.plan.len() {
            let planned = &self.plan[self.cursor];
            let step = planned.step.clone();
            if let Some(prompt) = &planned.prompt {
                self.gate.confirm(prompt).await?;
            }
            self.execute(&step)
                .await
                .map_err(|source| VnaError::CalibrationStepFailed {
                    step: step.clone(),
                    source: Box::new(source),
                })?;
            info!("calibration: {}", step);
            self.cursor += 1;
        }

        self.state = CalState::Completed;
        Ok(())
    }

    async fn execute(&self, step: &CalStep) -> Result<()> {
        let c = self.channel_no;
        match step {
            CalStep::SelectKit(kit) => {
                self.channel
                    .send(&format!(":SENS{c}:CORR:COLL:CKIT {kit}"))
                    .await
            }
            CalStep::SetMethod(CalMethod::SinglePort(port)) => {
                self.channel
                    .send(&format!(":SENS{c}:CORR:COLL:METH:SOLT1 {port}"))
                    .await
            }
            CalStep::SetMethod(CalMethod::TwoPort(a, b)) => {
                self.channel
                    .send(&format!(":SENS{c}:CORR:COLL:METH:SOLT2 {a},{b}"))
                    .await
            }
            CalStep::Capture { standard, port } => {
                self.channel
                    .send(&format!(
                        ":SENS{c}:CORR:COLL:{} {port}",
                        standard.mnemonic()
                    ))
                    .await?;
                self.channel
                    .wait_for_completion(self.settle, self.step_timeout)
                    .await
            }
            CalStep::Thru { from, to } => {
                self.channel
                    .send(&format!(":SENS{c}:CORR:COLL:THRU {from},{to}"))
                    .await?;
                self.channel
                    .wait_for_completion(self.settle, self.step_timeout)
                    .await
            }
            CalStep::ECal { port_a, port_b } => {
                self.channel
                    .send(&format!(":SENS{c}:CORR:COLL:ECAL:SOLT2 {port_a},{port_b}"))
                    .await?;
                self.channel
                    .wait_for_completion(self.settle, self.step_timeout)
                    .await
            }
            CalStep::Save => self.save().await,
        }
    }

    /// Measure one standard immediately, outside the planned sequence.
    ///
    /// The command is issued exactly as asked: the engine never reorders
    /// caller-driven steps, so honoring the grouping the instrument expects
    /// is the caller's job. The operator gate still runs first.
    pub async fn capture(&self, standard: CalStandard, port: u8) -> Result<()> {
        let step = CalStep::Capture { standard, port };
        self.gate
            .confirm(&format!("Connect the {standard} standard to port {port}."))
            .await?;
        self.execute(&step)
            .await
            .map_err(|source| VnaError::CalibrationStepFailed {
                step,
                source: Box::new(source),
            })
    }

    /// Measure the thru path in one direction, outside the planned
    /// sequence.
    pub async fn capture_thru(&self, from: u8, to: u8) -> Result<()> {
        let step = CalStep::Thru { from, to };
        self.gate
            .confirm(&format!(
                "Connect the THRU standard between port {from} and port {to}."
            ))
            .await?;
        self.execute(&step)
            .await
            .map_err(|source| VnaError::CalibrationStepFailed {
                step,
                source: Box::new(source),
            })
    }

    /// Commit the correction coefficients gathered so far.
    pub async fn save(&self) -> Result<()> {
        self.channel
            .send(&format!(":SENS{}:CORR:COLL:SAVE", self.channel_no))
            .await
    }

    /// Apply the saved corrections to subsequent measurements.
    pub async fn enable(&self) -> Result<()> {
        self.set_correction_state(true).await
    }

    /// Turn error correction on or off. Two-port procedures conventionally
    /// disable correction before capturing and re-enable after the save.
    pub async fn set_correction_state(&self, on: bool) -> Result<()> {
        self.channel
            .send(&format!(
                ":SENS{}:CORR:STAT {}",
                self.channel_no,
                u8::from(on)
            ))
            .await
    }

    /// Set the system characteristic impedance (Z0).
    pub async fn set_characteristic_impedance(&self, z0: f64) -> Result<()> {
        self.channel
            .send(&format!(":SENS{}:CORR:IMP {z0}", self.channel_no))
            .await
    }

    /// Turn automatic port extension on or off for one port.
    pub async fn set_auto_port_extension(&self, port: u8, on: bool) -> Result<()> {
        let state = if on { "ON" } else { "OFF" };
        self.channel
            .send(&format!(
                ":SENS{}:CORR:EXT:AUTO:PORT{port} {state}",
                self.channel_no
            ))
            .await
    }

    /// Run the automatic port extension measurement against an open or
    /// short termination. A successful measurement enables the feature on
    /// the instrument side.
    pub async fn measure_port_extension(&self, standard: CalStandard) -> Result<()> {
        let mnemonic = match standard {
            CalStandard::Open => "OPEN",
            CalStandard::Short => "SHORT",
            CalStandard::Load => {
                return Err(VnaError::Precondition(
                    "port extension is measured against an open or short, not a load"
                        .to_string(),
                ))
            }
        };
        self.channel
            .send(&format!(
                ":SENS{}:CORR:EXT:AUTO:MEAS {mnemonic}",
                self.channel_no
            ))
            .await
    }
}

fn standard_captures(port: u8) -> Vec<PlannedStep> {
    [CalStandard::Open, CalStandard::Short, CalStandard::Load]
        .into_iter()
        .map(|standard| PlannedStep {
            step: CalStep::Capture { standard, port },
            prompt: Some(format!(
                "Connect the {standard} standard to port {port}."
            )),
        })
        .collect()
}
