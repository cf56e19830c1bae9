use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use sysmon::error::{CaptureError, CaptureResult};
use sysmon::snapshot::MetricSnapshot;
use sysmon::{MetricSource, RunState};

/// One scripted capture outcome
#[derive(Debug, Clone)]
pub enum Step {
    Snapshot(MetricSnapshot),
    Fail(String),
}

impl From<MetricSnapshot> for Step {
    fn from(snapshot: MetricSnapshot) -> Self {
        Step::Snapshot(snapshot)
    }
}

/// Metric source that replays a fixed script.
///
/// Once the script runs out it keeps repeating the fallback snapshot. When a
/// [`RunState`] is attached, the capture that consumes the last step also
/// requests a stop, so a monitor run ends after exactly the scripted ticks.
#[derive(Clone)]
pub struct ScriptedSource {
    steps: Arc<Mutex<VecDeque<Step>>>,
    fallback: MetricSnapshot,
    captures: Arc<Mutex<u64>>,
    stop_when_done: Option<RunState>,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Step>, fallback: MetricSnapshot) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            fallback,
            captures: Arc::new(Mutex::new(0)),
            stop_when_done: None,
        }
    }

    /// Repeat `snapshot` forever
    pub fn repeating(snapshot: MetricSnapshot) -> Self {
        Self::new(Vec::new(), snapshot)
    }

    pub fn stop_when_done(mut self, run_state: RunState) -> Self {
        self.stop_when_done = Some(run_state);
        self
    }

    /// Number of captures performed so far
    pub fn captures(&self) -> u64 {
        *self.captures.lock().unwrap()
    }

    pub fn remaining(&self) -> usize {
        self.steps.lock().unwrap().len()
    }
}

impl MetricSource for ScriptedSource {
    fn capture(&mut self) -> CaptureResult<MetricSnapshot> {
        *self.captures.lock().unwrap() += 1;

        let (step, exhausted) = {
            let mut steps = self.steps.lock().unwrap();
            let step = steps.pop_front();
            (step, steps.is_empty())
        };

        if exhausted {
            if let Some(run_state) = &self.stop_when_done {
                run_state.request_stop();
            }
        }

        match step {
            Some(Step::Snapshot(snapshot)) => Ok(snapshot),
            Some(Step::Fail(reason)) => Err(CaptureError::Disk { reason }),
            None => Ok(self.fallback.clone()),
        }
    }
}
