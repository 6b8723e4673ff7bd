//! Capability table
//!
//! The only surface loaded code may call into. The host builds one table at
//! boot and passes a pointer to it on every invocation:
//!
//! ```text
//! window entry ──► fn(table: *const CapabilityTable, module_id: u32)
//!                          │
//!                          ├─ print(text)
//!                          ├─ set_indicator(state)
//!                          ├─ timer_init()   (peripheral-deps)
//!                          ├─ adc_init()     (peripheral-deps)
//!                          ├─ read_sensor() -> i32
//!                          └─ format_integer(buf, value)
//! ```
//!
//! Field order and count are a binary contract with module builds; the
//! size assertions below fail the build if either drifts.

use core::ffi::c_char;
use core::mem::size_of;

use static_assertions::const_assert_eq;

/// Print a NUL-terminated string
pub type PrintFn = extern "C" fn(text: *const c_char);
/// Drive the status indicator (0 = off, non-zero = on)
pub type IndicatorFn = extern "C" fn(state: u8);
/// Bring up one host peripheral
#[cfg(feature = "peripheral-deps")]
pub type InitFn = extern "C" fn();
/// Sample the board sensor
pub type SensorFn = extern "C" fn() -> i32;
/// Write `value` as NUL-terminated decimal into a buffer of at least
/// [`FORMAT_BUFFER_MIN`] bytes
pub type FormatFn = extern "C" fn(buffer: *mut c_char, value: i32);

/// Entry signature of a loaded function
pub type ModuleEntryFn = extern "C" fn(table: *const CapabilityTable, module_id: u32);

/// Smallest buffer `format_integer` accepts: sign, ten digits, NUL
pub const FORMAT_BUFFER_MIN: usize = 12;

/// Longest string `print` will emit
pub const PRINT_LIMIT: usize = 256;

/// Host services exposed to loaded code
#[derive(Clone, Copy)]
#[repr(C)]
pub struct CapabilityTable {
    pub print: PrintFn,
    pub set_indicator: IndicatorFn,
    #[cfg(feature = "peripheral-deps")]
    pub timer_init: InitFn,
    #[cfg(feature = "peripheral-deps")]
    pub adc_init: InitFn,
    pub read_sensor: SensorFn,
    pub format_integer: FormatFn,
}

#[cfg(not(feature = "peripheral-deps"))]
const_assert_eq!(size_of::<CapabilityTable>(), 4 * size_of::<usize>());
#[cfg(feature = "peripheral-deps")]
const_assert_eq!(size_of::<CapabilityTable>(), 6 * size_of::<usize>());

impl CapabilityTable {
    #[cfg(not(feature = "peripheral-deps"))]
    pub const fn new(
        print: PrintFn,
        set_indicator: IndicatorFn,
        read_sensor: SensorFn,
        format_integer: FormatFn,
    ) -> Self {
        Self {
            print,
            set_indicator,
            read_sensor,
            format_integer,
        }
    }

    #[cfg(feature = "peripheral-deps")]
    pub const fn new(
        print: PrintFn,
        set_indicator: IndicatorFn,
        timer_init: InitFn,
        adc_init: InitFn,
        read_sensor: SensorFn,
        format_integer: FormatFn,
    ) -> Self {
        Self {
            print,
            set_indicator,
            timer_init,
            adc_init,
            read_sensor,
            format_integer,
        }
    }
}

/// Write `value` as decimal ASCII followed by a NUL
///
/// Returns the number of characters written, terminator excluded, or
/// `None` if `out` is too small.
pub fn format_decimal(value: i32, out: &mut [u8]) -> Option<usize> {
    let mut digits = [0u8; 10];
    let mut magnitude = value.unsigned_abs();
    let mut count = 0;

    loop {
        digits[count] = b'0' + (magnitude % 10) as u8;
        count += 1;
        magnitude /= 10;
        if magnitude == 0 {
            break;
        }
    }

    let sign = usize::from(value < 0);
    let len = sign + count;
    if out.len() < len + 1 {
        return None;
    }

    if sign == 1 {
        out[0] = b'-';
    }
    for (slot, digit) in out[sign..len].iter_mut().zip(digits[..count].iter().rev()) {
        *slot = *digit;
    }
    out[len] = 0;

    Some(len)
}

/// Bytes of a NUL-terminated string, capped at [`PRINT_LIMIT`]
pub fn c_str_bytes(raw: &[u8]) -> &[u8] {
    let capped = &raw[..raw.len().min(PRINT_LIMIT)];
    match capped.iter().position(|&b| b == 0) {
        Some(end) => &capped[..end],
        None => capped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    extern "C" fn nop_print(_: *const c_char) {}
    extern "C" fn nop_indicator(_: u8) {}
    #[cfg(feature = "peripheral-deps")]
    extern "C" fn nop_init() {}
    extern "C" fn fixed_sensor() -> i32 {
        42
    }
    extern "C" fn nop_format(_: *mut c_char, _: i32) {}

    fn table() -> CapabilityTable {
        #[cfg(not(feature = "peripheral-deps"))]
        return CapabilityTable::new(nop_print, nop_indicator, fixed_sensor, nop_format);
        #[cfg(feature = "peripheral-deps")]
        return CapabilityTable::new(
            nop_print,
            nop_indicator,
            nop_init,
            nop_init,
            fixed_sensor,
            nop_format,
        );
    }

    #[test]
    fn test_table_slots_are_callable() {
        let table = table();
        assert_eq!((table.read_sensor)(), 42);
    }

    #[test]
    fn test_format_decimal_basic() {
        let mut buf = [0xAAu8; FORMAT_BUFFER_MIN];
        assert_eq!(format_decimal(1234, &mut buf), Some(4));
        assert_eq!(&buf[..5], b"1234\0");

        assert_eq!(format_decimal(0, &mut buf), Some(1));
        assert_eq!(&buf[..2], b"0\0");

        assert_eq!(format_decimal(-7, &mut buf), Some(2));
        assert_eq!(&buf[..3], b"-7\0");
    }

    #[test]
    fn test_format_decimal_extremes_fit_minimum_buffer() {
        let mut buf = [0u8; FORMAT_BUFFER_MIN];
        assert_eq!(format_decimal(i32::MIN, &mut buf), Some(11));
        assert_eq!(&buf[..], b"-2147483648\0");

        assert_eq!(format_decimal(i32::MAX, &mut buf), Some(10));
        assert_eq!(&buf[..11], b"2147483647\0");
    }

    #[test]
    fn test_format_decimal_rejects_short_buffer() {
        let mut buf = [0u8; 4];
        assert_eq!(format_decimal(1234, &mut buf), None);
        assert_eq!(format_decimal(123, &mut buf), Some(3));
    }

    #[test]
    fn test_c_str_bytes_stops_at_nul_or_limit() {
        assert_eq!(c_str_bytes(b"hello\0world"), b"hello");
        assert_eq!(c_str_bytes(b"no terminator"), b"no terminator");

        let long = [b'a'; PRINT_LIMIT + 10];
        assert_eq!(c_str_bytes(&long).len(), PRINT_LIMIT);
    }

    proptest! {
        #[test]
        fn test_format_decimal_matches_display(value in any::<i32>()) {
            let mut buf = [0u8; FORMAT_BUFFER_MIN];
            let len = format_decimal(value, &mut buf).unwrap();
            let expected = value.to_string();
            prop_assert_eq!(&buf[..len], expected.as_bytes());
            prop_assert_eq!(buf[len], 0);
        }
    }
}
