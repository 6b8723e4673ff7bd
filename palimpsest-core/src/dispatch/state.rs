//! Selection state and cursors

use palimpsest_abi::MAX_MODULES;

/// Dispatcher states
///
/// Module and function positions are indexes into the catalog's populated
/// modules and a module's function list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchState {
    /// Waiting for the first activation
    #[default]
    Idle,
    /// A module is highlighted
    ModuleSelected { module: usize },
    /// A function is highlighted; the next activation runs it
    FunctionSelected { module: usize, function: usize },
    /// A load failed under the fail-stop policy
    Halted,
}

impl DispatchState {
    /// Mid-selection states, which are subject to the idle timeout
    pub fn is_selecting(&self) -> bool {
        matches!(
            self,
            DispatchState::ModuleSelected { .. } | DispatchState::FunctionSelected { .. }
        )
    }
}

/// Cyclic selection cursors
///
/// These outlive a single selection round: timing out or running a
/// function resets the state, not the cursors, so the next round picks up
/// where the last one left off.
#[derive(Debug, Clone, Default)]
pub struct Cursors {
    module: Option<usize>,
    functions: [Option<usize>; MAX_MODULES],
}

impl Cursors {
    pub const fn new() -> Self {
        Self {
            module: None,
            functions: [None; MAX_MODULES],
        }
    }

    /// Advance the module cursor over `count` modules
    pub fn next_module(&mut self, count: usize) -> usize {
        let next = advance(self.module, count);
        self.module = Some(next);
        next
    }

    /// Advance `module`'s function cursor over `count` functions
    pub fn next_function(&mut self, module: usize, count: usize) -> usize {
        let slot = &mut self.functions[module];
        let next = advance(*slot, count);
        *slot = Some(next);
        next
    }
}

fn advance(current: Option<usize>, count: usize) -> usize {
    match current {
        Some(i) => (i + 1) % count,
        None => 0,
    }
}
