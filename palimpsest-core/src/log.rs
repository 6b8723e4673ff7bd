//! No-op logging macros used when `defmt` is disabled

#![allow(unused_macros, unused_imports)]

macro_rules! trace {
    ($($arg:tt)*) => {};
}
pub(crate) use trace;

macro_rules! debug {
    ($($arg:tt)*) => {};
}
pub(crate) use debug;

macro_rules! info {
    ($($arg:tt)*) => {};
}
pub(crate) use info;

macro_rules! warner {
    ($($arg:tt)*) => {};
}
pub(crate) use warner as warn;

macro_rules! error {
    ($($arg:tt)*) => {};
}
pub(crate) use error;
