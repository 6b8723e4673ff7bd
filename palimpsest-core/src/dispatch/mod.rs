//! Selection and execution
//!
//! One activation line drives everything: the first press picks a module,
//! the second a function, the third loads and runs it.

mod dispatcher;
mod input;
mod state;

pub use dispatcher::{Dispatcher, Host, Outcome};
pub use input::{ActivationFilter, InputEvent};
pub use state::{Cursors, DispatchState};
