//! Palimpsest - overlay loader firmware
//!
//! Resident core for STM32F401 boards. Code modules live in an external
//! W25Qxx NOR flash; a single button walks through modules and functions,
//! and the selected function is fetched, verified, placed in the execution
//! window and called.
//!
//! Board wiring (WeAct Black Pill):
//!
//! | Signal             | Pin                |
//! |--------------------|--------------------|
//! | Console TX         | PA2 (USART2)       |
//! | NOR SCK/MISO/MOSI  | PA5/PA6/PA7 (SPI1) |
//! | NOR CS             | PA4                |
//! | Button             | PB0, active low    |
//! | LED                | PC13, active low   |

#![no_std]
#![no_main]

mod board;

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::crc::Crc;
use embassy_stm32::flash::Flash;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{self, UartTx};
use embassy_time::{Duration, Ticker};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use palimpsest_core::{
    Dispatcher, DispatcherConfig, FunctionLoader, Loader, LoaderLayout, ModuleCatalog, Outcome,
    WindowEntry,
};
use palimpsest_drivers::{BoardServices, StatusLed, UartConsole, W25q};
use palimpsest_hal::{ActiveLow, Clock, InputPin};
use palimpsest_hal_stm32f4::uart::UartConfig;
use palimpsest_hal_stm32f4::{
    EmbassyClock, HalInput, HalOutput, HalSpi, HalUart, HardwareCrc, PlacementTarget,
};

use crate::board::BoardHost;

/// Catalog decoded at boot, read-only afterwards
static CATALOG: StaticCell<ModuleCatalog> = StaticCell::new();

/// Source flash size (W25Q32)
const SOURCE_CAPACITY: u32 = 4 * 1024 * 1024;

/// SPI clock for the source flash
const SOURCE_SPI_HZ: u32 = 8_000_000;

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Palimpsest firmware starting...");

    let p = embassy_stm32::init(Default::default());
    info!("Peripherals initialized");

    let config = DispatcherConfig::default();
    let layout = LoaderLayout::STM32F401;

    // Console and LED first so later failures are visible
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = UartConfig::default().baudrate;
    let tx = match UartTx::new_blocking(p.USART2, p.PA2, uart_config) {
        Ok(tx) => tx,
        Err(_) => {
            error!("USART2 configuration rejected");
            board::blink_forever(config.timing.blink_ms);
        }
    };
    let led_pin = HalOutput::new(Output::new(p.PC13, Level::High, Speed::Low), true);
    let led = StatusLed::new_active_low(led_pin);
    board::install(BoardServices::new(UartConsole::new(HalUart::new(tx)), led));
    board::print_line("Palimpsest");

    // External NOR flash on SPI1
    let mut spi_config = spi::Config::default();
    spi_config.frequency = Hertz(SOURCE_SPI_HZ);
    let spi = Spi::new_blocking(p.SPI1, p.PA5, p.PA7, p.PA6, spi_config);
    let cs = HalOutput::new(Output::new(p.PA4, Level::High, Speed::VeryHigh), true);
    let mut source = W25q::new(HalSpi::new(spi), cs, SOURCE_CAPACITY);

    match source.jedec_id() {
        Ok(id) => info!(
            "Source flash JEDEC id {:x} {:x} {:x}",
            id.manufacturer, id.memory_type, id.capacity
        ),
        Err(e) => warn!("Source flash JEDEC read failed: {}", e),
    }

    let catalog = CATALOG.init(ModuleCatalog::new());
    match catalog.load(&mut source, layout.catalog_address) {
        Ok(count) => info!("Catalog: {} modules", count),
        Err(e) => {
            error!("Catalog load failed: {}", e);
            board::print_line("Catalog error");
            board::blink_forever(config.timing.blink_ms);
        }
    }
    let catalog: &'static ModuleCatalog = catalog;
    for module in catalog.modules() {
        info!(
            "  module {}: {} functions at {:x}",
            module.module_id,
            module.function_count(),
            module.base_address
        );
    }

    // Window sector through the 16K-sector flash region, GOT/PLT in reserved SRAM
    let flash = Flash::new_blocking(p.FLASH).into_blocking_regions().bank1_region1;
    let window = layout.window_address..layout.window_address + layout.window_size;
    let relocations = layout.got.target_address..layout.plt.target_address + layout.plt.size;
    let target = match PlacementTarget::new(flash, window, relocations) {
        Ok(target) => target,
        Err(e) => {
            error!("Placement target rejected: {}", e);
            board::blink_forever(config.timing.blink_ms);
        }
    };

    let checksum = HardwareCrc::new(Crc::new(p.CRC));
    let loader = Loader::new(source, target, checksum, layout);

    // SAFETY: the dispatcher only enters after a verified load, and memory.x
    // keeps resident code out of the window sector.
    let entry = unsafe { WindowEntry::new(loader.layout().entry_address()) };

    let clock = EmbassyClock;
    let mut button = ActiveLow(HalInput::new(Input::new(p.PB0, Pull::Up)));
    let mut dispatcher = Dispatcher::new(
        catalog,
        &board::TABLE,
        loader,
        BoardHost::new(clock),
        entry,
        config,
    );

    info!("Dispatcher ready");

    let poll_interval = Duration::from_millis(u64::from(config.timing.poll_interval_ms));
    let mut ticker = Ticker::every(poll_interval);
    loop {
        let outcome = dispatcher.poll(clock.now_ms(), button.is_high());
        if outcome != Outcome::None {
            debug!("dispatch: {}", outcome);
        }

        if dispatcher.is_halted() {
            error!("Halted after failed load; reset required");
            dispatcher.run_halted();
        }

        ticker.next().await;
    }
}
