//! Board services and capability table
//!
//! Loaded code reaches the console and LED through `extern "C"` pointers,
//! which cannot carry state. The services therefore live in a global that
//! both the shims and the dispatcher's [`Host`] lock per call. Nothing
//! holds the lock while loaded code runs.

use core::cell::RefCell;
use core::ffi::c_char;

use embassy_stm32::gpio::Output;
use embassy_stm32::mode::Blocking;
use embassy_stm32::usart::UartTx;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use palimpsest_abi::{c_str_bytes, format_decimal, CapabilityTable, FORMAT_BUFFER_MIN, PRINT_LIMIT};
use palimpsest_core::Host;
use palimpsest_drivers::BoardServices;
use palimpsest_hal::Clock;
use palimpsest_hal_stm32f4::{EmbassyClock, HalOutput, HalUart};

#[cfg(feature = "peripheral-deps")]
use defmt::info;
#[cfg(feature = "peripheral-deps")]
use palimpsest_abi::PeripheralMask;
#[cfg(feature = "peripheral-deps")]
use portable_atomic::{AtomicBool, Ordering};

pub type Services = BoardServices<HalUart<UartTx<'static, Blocking>>, HalOutput<Output<'static>>>;

static SERVICES: Mutex<CriticalSectionRawMutex, RefCell<Option<Services>>> =
    Mutex::new(RefCell::new(None));

/// No sensor is fitted on the reference board; loaded code sees a fixed reading
const FIXED_SENSOR_READING: i32 = 42;

#[cfg(feature = "peripheral-deps")]
static TIMER_READY: AtomicBool = AtomicBool::new(false);
#[cfg(feature = "peripheral-deps")]
static ADC_READY: AtomicBool = AtomicBool::new(false);

#[cfg(not(feature = "peripheral-deps"))]
pub static TABLE: CapabilityTable = CapabilityTable::new(
    host_print,
    host_set_indicator,
    host_read_sensor,
    host_format_integer,
);

#[cfg(feature = "peripheral-deps")]
pub static TABLE: CapabilityTable = CapabilityTable::new(
    host_print,
    host_set_indicator,
    host_timer_init,
    host_adc_init,
    host_read_sensor,
    host_format_integer,
);

/// Hand the console and LED over to the global
pub fn install(services: Services) {
    SERVICES.lock(|cell| *cell.borrow_mut() = Some(services));
}

fn with_services(f: impl FnOnce(&mut Services)) {
    SERVICES.lock(|cell| {
        if let Ok(mut slot) = cell.try_borrow_mut() {
            if let Some(services) = slot.as_mut() {
                f(services);
            }
        }
    });
}

pub fn print_line(text: &str) {
    with_services(|s| s.print_line(text));
}

/// Blink at `blink_ms` forever
///
/// Used when the system cannot continue (catalog or placement errors at
/// boot, fail-stop after a failed load).
pub fn blink_forever(blink_ms: u32) -> ! {
    let mut clock = EmbassyClock;
    loop {
        with_services(|s| s.set_indicator(true));
        clock.delay_ms(blink_ms);
        with_services(|s| s.set_indicator(false));
        clock.delay_ms(blink_ms);
    }
}

extern "C" fn host_print(text: *const c_char) {
    if text.is_null() {
        return;
    }

    let mut buf = [0u8; PRINT_LIMIT];
    let src = text as *const u8;
    for (i, slot) in buf.iter_mut().enumerate() {
        // SAFETY: loaded code passes a NUL-terminated string; reading stops
        // at the terminator or after PRINT_LIMIT bytes, whichever is first.
        let byte = unsafe { src.add(i).read() };
        if byte == 0 {
            break;
        }
        *slot = byte;
    }

    with_services(|s| s.print_raw(c_str_bytes(&buf)));
}

extern "C" fn host_set_indicator(state: u8) {
    with_services(|s| s.set_indicator(state != 0));
}

extern "C" fn host_read_sensor() -> i32 {
    FIXED_SENSOR_READING
}

extern "C" fn host_format_integer(buffer: *mut c_char, value: i32) {
    if buffer.is_null() {
        return;
    }
    // SAFETY: callers provide at least FORMAT_BUFFER_MIN writable bytes,
    // which fits any i32 plus sign and terminator.
    let out = unsafe { core::slice::from_raw_parts_mut(buffer as *mut u8, FORMAT_BUFFER_MIN) };
    let _ = format_decimal(value, out);
}

#[cfg(feature = "peripheral-deps")]
extern "C" fn host_timer_init() {
    if !TIMER_READY.swap(true, Ordering::Relaxed) {
        info!("board: timer ready");
    }
}

#[cfg(feature = "peripheral-deps")]
extern "C" fn host_adc_init() {
    if !ADC_READY.swap(true, Ordering::Relaxed) {
        info!("board: ADC ready");
    }
}

/// Dispatcher host over the global services
pub struct BoardHost {
    clock: EmbassyClock,
}

impl BoardHost {
    pub fn new(clock: EmbassyClock) -> Self {
        Self { clock }
    }
}

impl Host for BoardHost {
    fn print_line(&mut self, text: &str) {
        print_line(text);
    }

    fn set_indicator(&mut self, on: bool) {
        with_services(|s| s.set_indicator(on));
    }

    // Outside the lock so a blink does not hold a critical section
    fn delay_ms(&mut self, ms: u32) {
        self.clock.delay_ms(ms);
    }

    #[cfg(feature = "peripheral-deps")]
    fn init_peripherals(&mut self, mask: PeripheralMask) {
        // UART and GPIO are up before the dispatcher starts
        if mask.contains(PeripheralMask::TIMER) {
            host_timer_init();
        }
        if mask.contains(PeripheralMask::ADC) {
            host_adc_init();
        }
    }
}
