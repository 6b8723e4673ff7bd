//! Button-driven module dispatcher
//!
//! ```text
//!            press                 press                   press
//!   Idle ───────────► Module ───────────► Function ───────────► load + run
//!    ▲                Selected            Selected                  │
//!    │                   │                   │                      │
//!    └──── idle timeout ─┴───────────────────┘◄─────────────────────┘
//! ```
//!
//! A failed load either blinks and returns to `Idle` or halts, depending
//! on the [`FailurePolicy`].

use core::fmt::Write;

use heapless::String;
use palimpsest_abi::CapabilityTable;

#[cfg(feature = "peripheral-deps")]
use palimpsest_abi::PeripheralMask;

use super::input::{ActivationFilter, InputEvent};
use super::state::{Cursors, DispatchState};
use crate::catalog::ModuleCatalog;
use crate::config::{DispatcherConfig, FailurePolicy};
use crate::entry::EntryPoint;
use crate::loader::{FunctionLoader, LoadError};
use crate::log::{debug, error, info};

/// Board services the dispatcher needs
pub trait Host {
    /// Emit one line of user-facing text
    fn print_line(&mut self, text: &str);

    /// Drive the status indicator
    fn set_indicator(&mut self, on: bool);

    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);

    /// Bring up the peripherals a function depends on
    #[cfg(feature = "peripheral-deps")]
    fn init_peripherals(&mut self, mask: PeripheralMask);
}

/// What a single poll did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Nothing happened
    None,
    /// Activation with an empty catalog
    NoModules,
    /// The highlighted module has no functions; back to idle
    NoFunctions { module_id: u32 },
    ModuleSelected { module_id: u32 },
    FunctionSelected { module_id: u32, index: usize },
    /// The function was loaded and returned
    Executed { module_id: u32, index: usize },
    LoadFailed(LoadError),
    /// Selection abandoned after inactivity
    TimedOut,
    /// Fail-stop halt; nothing more will happen
    Halted,
}

/// Selection state machine bound to a catalog, a loader and a host
pub struct Dispatcher<'a, L, H, E> {
    catalog: &'a ModuleCatalog,
    table: &'a CapabilityTable,
    loader: L,
    host: H,
    entry: E,
    config: DispatcherConfig,
    filter: ActivationFilter,
    state: DispatchState,
    cursors: Cursors,
}

impl<'a, L, H, E> Dispatcher<'a, L, H, E>
where
    L: FunctionLoader,
    H: Host,
    E: EntryPoint,
{
    pub fn new(
        catalog: &'a ModuleCatalog,
        table: &'a CapabilityTable,
        loader: L,
        host: H,
        entry: E,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            catalog,
            table,
            loader,
            host,
            entry,
            filter: ActivationFilter::new(&config.timing),
            config,
            state: DispatchState::Idle,
            cursors: Cursors::new(),
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == DispatchState::Halted
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Sample the input once and act on it
    pub fn poll(&mut self, now_ms: u32, pressed: bool) -> Outcome {
        if self.is_halted() {
            return Outcome::Halted;
        }

        match self
            .filter
            .update(now_ms, pressed, self.state.is_selecting())
        {
            Some(InputEvent::Activation) => self.activate(),
            Some(InputEvent::IdleTimeout) => {
                debug!("dispatch: selection timed out");
                self.state = DispatchState::Idle;
                Outcome::TimedOut
            }
            None => Outcome::None,
        }
    }

    /// Blink the failure pattern forever
    ///
    /// Used once the dispatcher has halted under the fail-stop policy.
    pub fn run_halted(&mut self) -> ! {
        let blink_ms = self.config.timing.blink_ms;
        loop {
            self.blink_once(blink_ms);
        }
    }

    fn activate(&mut self) -> Outcome {
        let catalog = self.catalog;

        match self.state {
            DispatchState::Idle => {
                if catalog.is_empty() {
                    self.host.print_line("No modules");
                    return Outcome::NoModules;
                }
                let module = self.cursors.next_module(catalog.len());
                let module_id = catalog.modules()[module].module_id;
                self.state = DispatchState::ModuleSelected { module };

                let mut line: String<32> = String::new();
                let _ = write!(line, "Selected module {}", module_id);
                self.host.print_line(&line);
                info!("dispatch: module {} selected", module_id);
                Outcome::ModuleSelected { module_id }
            }
            DispatchState::ModuleSelected { module } => {
                let selected = &catalog.modules()[module];
                let count = selected.function_count();
                if count == 0 {
                    self.host.print_line("No functions");
                    self.state = DispatchState::Idle;
                    return Outcome::NoFunctions {
                        module_id: selected.module_id,
                    };
                }

                let function = self.cursors.next_function(module, count);
                self.state = DispatchState::FunctionSelected { module, function };

                let mut line: String<48> = String::new();
                let _ = write!(line, "Selected function {}", selected.functions[function].name);
                self.host.print_line(&line);
                Outcome::FunctionSelected {
                    module_id: selected.module_id,
                    index: function,
                }
            }
            DispatchState::FunctionSelected { module, function } => {
                self.state = DispatchState::Idle;
                self.execute(module, function)
            }
            DispatchState::Halted => Outcome::Halted,
        }
    }

    fn execute(&mut self, module: usize, function: usize) -> Outcome {
        let catalog = self.catalog;
        let selected = &catalog.modules()[module];
        let module_id = selected.module_id;

        #[cfg(feature = "peripheral-deps")]
        self.host
            .init_peripherals(selected.functions[function].peripherals);

        match self.loader.load_function(selected, function) {
            Ok(()) => {
                info!("dispatch: entering module {} function {}", module_id, function);
                self.entry.enter(self.table, module_id);
                Outcome::Executed {
                    module_id,
                    index: function,
                }
            }
            Err(e) => {
                error!("dispatch: load failed: {}", e);
                self.host.print_line("Function load failed");
                match self.config.failure {
                    FailurePolicy::Recoverable { blinks } => {
                        let blink_ms = self.config.timing.blink_ms;
                        for _ in 0..blinks {
                            self.blink_once(blink_ms);
                        }
                    }
                    FailurePolicy::FailStop => self.state = DispatchState::Halted,
                }
                Outcome::LoadFailed(e)
            }
        }
    }

    fn blink_once(&mut self, blink_ms: u32) {
        self.host.set_indicator(true);
        self.host.delay_ms(blink_ms);
        self.host.set_indicator(false);
        self.host.delay_ms(blink_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DispatchTiming, LoaderLayout};
    use crate::test_support::{table, RecordingEntry, RecordingHost, ScriptedLoader};
    use proptest::prelude::*;

    fn catalog(shape: &[(u32, usize)]) -> ModuleCatalog {
        let mut catalog = ModuleCatalog::new();
        for &(id, functions) in shape {
            let mut record = palimpsest_abi::ModuleRecord::new(id, id * 0x1000, 0);
            for i in 0..functions {
                let name = format!("m{id}f{i}");
                record
                    .push_function(palimpsest_abi::FunctionRecord::new(i as u32, &name, 0, 4, 0))
                    .unwrap();
            }
            catalog.push_record(&record).unwrap();
        }
        catalog
    }

    /// Drives presses spaced past the debounce interval
    struct Driver<'a> {
        dispatcher: Dispatcher<'a, ScriptedLoader, RecordingHost, RecordingEntry>,
        now: u32,
    }

    impl<'a> Driver<'a> {
        fn new(
            catalog: &'a ModuleCatalog,
            table: &'a CapabilityTable,
            config: DispatcherConfig,
        ) -> Self {
            Self {
                dispatcher: Dispatcher::new(
                    catalog,
                    table,
                    ScriptedLoader::default(),
                    RecordingHost::default(),
                    RecordingEntry::default(),
                    config,
                ),
                now: 0,
            }
        }

        fn press(&mut self) -> Outcome {
            self.now += 300;
            let outcome = self.dispatcher.poll(self.now, true);
            self.dispatcher.poll(self.now + 10, false);
            outcome
        }

        fn wait(&mut self, ms: u32) -> Outcome {
            self.now += ms;
            self.dispatcher.poll(self.now, false)
        }
    }

    #[test]
    fn test_full_round_executes() {
        let catalog = catalog(&[(1, 2), (2, 1)]);
        let table = table();
        let mut d = Driver::new(&catalog, &table, DispatcherConfig::default());

        assert_eq!(d.press(), Outcome::ModuleSelected { module_id: 1 });
        assert_eq!(
            d.press(),
            Outcome::FunctionSelected {
                module_id: 1,
                index: 0
            }
        );
        assert_eq!(
            d.press(),
            Outcome::Executed {
                module_id: 1,
                index: 0
            }
        );
        assert_eq!(d.dispatcher.state(), DispatchState::Idle);
        assert_eq!(d.dispatcher.entry.calls, [1]);
        assert_eq!(d.dispatcher.loader.loads, [(1, 0)]);
        assert_eq!(
            d.dispatcher.host().lines,
            ["Selected module 1", "Selected function m1f0"]
        );
    }

    #[test]
    fn test_empty_catalog_reports_no_modules() {
        let catalog = ModuleCatalog::new();
        let table = table();
        let mut d = Driver::new(&catalog, &table, DispatcherConfig::default());

        assert_eq!(d.press(), Outcome::NoModules);
        assert_eq!(d.dispatcher.state(), DispatchState::Idle);
        assert_eq!(d.dispatcher.host().lines, ["No modules"]);
    }

    #[test]
    fn test_module_without_functions_returns_to_idle() {
        let catalog = catalog(&[(4, 0)]);
        let table = table();
        let mut d = Driver::new(&catalog, &table, DispatcherConfig::default());

        d.press();
        assert_eq!(d.press(), Outcome::NoFunctions { module_id: 4 });
        assert_eq!(d.dispatcher.state(), DispatchState::Idle);
    }

    #[test]
    fn test_timeout_keeps_cursors() {
        let catalog = catalog(&[(1, 1), (2, 1), (3, 1)]);
        let table = table();
        let mut d = Driver::new(&catalog, &table, DispatcherConfig::default());

        assert_eq!(d.press(), Outcome::ModuleSelected { module_id: 1 });
        assert_eq!(d.wait(1001), Outcome::TimedOut);
        assert_eq!(d.dispatcher.state(), DispatchState::Idle);
        assert_eq!(d.press(), Outcome::ModuleSelected { module_id: 2 });
        assert!(d.dispatcher.loader.loads.is_empty());
    }

    #[test]
    fn test_recoverable_failure_blinks_and_allows_retry() {
        let catalog = catalog(&[(1, 1)]);
        let table = table();
        let mut d = Driver::new(&catalog, &table, DispatcherConfig::default());
        d.dispatcher.loader.fail_with = Some(LoadError::EmptyImage);

        d.press();
        d.press();
        assert_eq!(d.press(), Outcome::LoadFailed(LoadError::EmptyImage));
        assert!(d.dispatcher.entry.calls.is_empty());
        assert_eq!(d.dispatcher.host().lines.last().unwrap(), "Function load failed");
        assert_eq!(d.dispatcher.host().indicator, [true, false, true, false, true, false]);
        assert_eq!(d.dispatcher.host().delays, [250; 6]);

        d.dispatcher.loader.fail_with = None;
        d.press();
        d.press();
        assert_eq!(
            d.press(),
            Outcome::Executed {
                module_id: 1,
                index: 0
            }
        );
    }

    #[test]
    fn test_fail_stop_halts() {
        let catalog = catalog(&[(1, 1)]);
        let table = table();
        let config = DispatcherConfig {
            failure: FailurePolicy::FailStop,
            ..Default::default()
        };
        let mut d = Driver::new(&catalog, &table, config);
        d.dispatcher.loader.fail_with = Some(LoadError::EmptyImage);

        d.press();
        d.press();
        assert_eq!(d.press(), Outcome::LoadFailed(LoadError::EmptyImage));
        assert!(d.dispatcher.is_halted());
        assert_eq!(d.press(), Outcome::Halted);
        assert!(d.dispatcher.host().indicator.is_empty());
    }

    #[test]
    fn test_bounce_within_debounce_is_ignored() {
        let catalog = catalog(&[(1, 1), (2, 1)]);
        let table = table();
        let mut d = Driver::new(&catalog, &table, DispatcherConfig::default());

        assert_eq!(
            d.dispatcher.poll(1000, true),
            Outcome::ModuleSelected { module_id: 1 }
        );
        d.dispatcher.poll(1050, false);
        assert_eq!(d.dispatcher.poll(1100, true), Outcome::None);
        assert_eq!(d.dispatcher.state(), DispatchState::ModuleSelected { module: 0 });
    }

    #[test]
    fn test_custom_timing() {
        let catalog = catalog(&[(1, 1)]);
        let table = table();
        let config = DispatcherConfig {
            timing: DispatchTiming {
                idle_timeout_ms: 5000,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut d = Driver::new(&catalog, &table, config);

        d.press();
        assert_eq!(d.wait(2000), Outcome::None);
        assert_eq!(d.wait(3001), Outcome::TimedOut);
    }

    proptest! {
        #[test]
        fn test_module_rounds_cycle_in_catalog_order(n in 1usize..=20, rounds in 1usize..60) {
            let shape: Vec<(u32, usize)> = (0..n).map(|i| (100 + i as u32 * 7, 1)).collect();
            let catalog = catalog(&shape);
            let table = table();
            let mut d = Driver::new(&catalog, &table, DispatcherConfig::default());

            for round in 0..rounds {
                let expected = shape[round % n].0;
                prop_assert_eq!(d.press(), Outcome::ModuleSelected { module_id: expected });
                prop_assert_eq!(d.wait(1001), Outcome::TimedOut);
            }
        }

        #[test]
        fn test_function_rounds_cycle(m in 1usize..=20, rounds in 1usize..60) {
            let catalog = catalog(&[(9, m)]);
            let table = table();
            let mut d = Driver::new(&catalog, &table, DispatcherConfig::default());

            for round in 0..rounds {
                prop_assert_eq!(d.press(), Outcome::ModuleSelected { module_id: 9 });
                prop_assert_eq!(
                    d.press(),
                    Outcome::FunctionSelected { module_id: 9, index: round % m }
                );
                prop_assert_eq!(d.press(), Outcome::Executed { module_id: 9, index: round % m });
            }
            prop_assert_eq!(d.dispatcher.entry.calls.len(), rounds);
        }

        #[test]
        fn test_timeout_never_loads(depth in 1usize..=2, idle in 1001u32..100_000) {
            let catalog = catalog(&[(1, 3), (2, 3)]);
            let table = table();
            let mut d = Driver::new(&catalog, &table, DispatcherConfig::default());

            for _ in 0..depth {
                d.press();
            }
            prop_assert!(d.dispatcher.state().is_selecting());
            prop_assert_eq!(d.wait(idle), Outcome::TimedOut);
            prop_assert_eq!(d.dispatcher.state(), DispatchState::Idle);
            prop_assert!(d.dispatcher.loader.loads.is_empty());
        }
    }

    #[cfg(feature = "peripheral-deps")]
    #[test]
    fn test_peripherals_initialized_before_load() {
        use palimpsest_abi::PeripheralMask;

        let mask = PeripheralMask::TIMER.union(PeripheralMask::ADC);
        let mut record = palimpsest_abi::ModuleRecord::new(1, 0x1000, 0);
        record
            .push_function(
                palimpsest_abi::FunctionRecord::new(0, "sample", 0, 4, 0).with_peripherals(mask),
            )
            .unwrap();
        let mut catalog = ModuleCatalog::new();
        catalog.push_record(&record).unwrap();
        let table = table();
        let mut d = Driver::new(&catalog, &table, DispatcherConfig::default());
        d.dispatcher.loader.fail_with = Some(LoadError::EmptyImage);

        d.press();
        d.press();
        d.press();
        // Init runs even when the load then fails
        assert_eq!(d.dispatcher.host().peripherals, [mask]);
    }

    #[test]
    fn test_loader_layout_reachable_through_trait() {
        let loader = ScriptedLoader::default();
        assert_eq!(FunctionLoader::layout(&loader), &LoaderLayout::STM32F401);
    }
}
