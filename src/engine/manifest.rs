use std::fmt;

use super::Export;

/// Steps the engine can time during a forward pass.
pub const FORWARD_STEPS: &[&str] = &["time", "a_1", "a_2", "b"];

/// Steps the engine can time during a backward pass.
pub const BACKWARD_STEPS: &[&str] = &[
    "time", "a", "b_1", "b_2", "c_1", "c_2", "d_1", "d_2", "e", "f_1", "f_2", "g_1", "g_2",
];

const SELF_TEST_PREFIX: &str = "test_";

/// The pass a diagnostic hook belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Forward,
    Backward,
}

impl Phase {
    fn prefix(self) -> &'static str {
        match self {
            Phase::Forward => "forward",
            Phase::Backward => "backward",
        }
    }

    /// Every step the engine may report for this phase.
    pub fn steps(self) -> &'static [&'static str] {
        match self {
            Phase::Forward => FORWARD_STEPS,
            Phase::Backward => BACKWARD_STEPS,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// An optional step-timing introspection entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticHook {
    phase: Phase,
    step: &'static str,
}

impl DiagnosticHook {
    /// Creates a new `DiagnosticHook`.
    ///
    /// # Arguments
    /// * `phase` - The pass the step belongs to.
    /// * `step` - One of the phase's known steps.
    pub fn new(phase: Phase, step: &'static str) -> Self {
        debug_assert!(phase.steps().contains(&step), "unknown {phase} step {step}");
        Self { phase, step }
    }

    /// Every hook the engine may implement for `phase`, in reporting order.
    pub fn all(phase: Phase) -> impl Iterator<Item = DiagnosticHook> {
        phase.steps().iter().map(move |&step| Self { phase, step })
    }

    /// Resolves an export name into one of the known hooks.
    pub fn parse(name: &str) -> Option<Self> {
        [Phase::Forward, Phase::Backward].into_iter().find_map(|phase| {
            let step = name.strip_prefix(phase.prefix())?.strip_prefix('_')?;
            Self::all(phase).find(|hook| hook.step == step)
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn step(&self) -> &'static str {
        self.step
    }

    /// The export name of the hook.
    pub fn name(&self) -> String {
        format!("{}_{}", self.phase.prefix(), self.step)
    }

    /// Sort key placing forward hooks first, each phase in step order.
    fn order(&self) -> (Phase, usize) {
        let position = self.phase.steps().iter().position(|&s| s == self.step);
        (self.phase, position.unwrap_or(usize::MAX))
    }
}

/// The optional capabilities an engine implements, reported once at setup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    hooks: Vec<DiagnosticHook>,
    self_tests: Vec<String>,
}

impl Manifest {
    /// Creates a new `Manifest`.
    ///
    /// # Arguments
    /// * `hooks` - The diagnostic hooks the engine implements, in any order.
    /// * `self_tests` - The export names of the engine's self-test entry points.
    pub fn new(mut hooks: Vec<DiagnosticHook>, self_tests: Vec<String>) -> Self {
        hooks.sort_by_key(DiagnosticHook::order);
        hooks.dedup();
        Self { hooks, self_tests }
    }

    /// Builds a manifest out of an engine's export names.
    ///
    /// For bindings that only know the raw export table. Names that are neither a known
    /// hook nor a self test are ignored.
    pub fn from_export_names<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let sweep = Export::TestBatchesInMemory.name();
        let mut hooks = Vec::new();
        let mut self_tests = Vec::new();

        for name in names {
            if let Some(hook) = DiagnosticHook::parse(name) {
                hooks.push(hook);
            } else if name.starts_with(SELF_TEST_PREFIX) && name != sweep {
                self_tests.push(name.to_string());
            }
        }

        Self::new(hooks, self_tests)
    }

    /// The hooks implemented for `phase`, in step order.
    pub fn hooks(&self, phase: Phase) -> impl Iterator<Item = DiagnosticHook> + '_ {
        self.hooks
            .iter()
            .copied()
            .filter(move |hook| hook.phase == phase)
    }

    /// Whether at least one hook of `phase` is implemented.
    pub fn has_phase(&self, phase: Phase) -> bool {
        self.hooks(phase).next().is_some()
    }

    pub fn self_tests(&self) -> &[String] {
        &self.self_tests
    }
}
