#![no_std]
#![no_main]

use defmt::{error, info};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::flash::Flash;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::{UART1, USB};
use embassy_rp::uart::Uart;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Delay;
use embassy_usb::class::hid::State;
use embassy_usb::{Builder, Config as UsbConfig};
use serial_keywedge_rp2040::{
    configure_usb_keyboard, default_config, instrument_uart_config, load_config, CaptureMachine,
    Dispatcher, FlashConfigStore, FrameHandoff, UartSerial, UsLayout, UsbKeyboard, TRIGGER_EDGE,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => embassy_rp::uart::InterruptHandler<UART1>;
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

type Handoff = FrameHandoff<CriticalSectionRawMutex>;
type Capture = CaptureMachine<UartSerial<'static>, Input<'static>, Delay>;

/// Frame and config shared by the capture and dispatch tasks.
static HANDOFF: StaticCell<Handoff> = StaticCell::new();

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// HID state.
static HID_STATE: StaticCell<State> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Serial keyboard wedge starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Config ---
    let mut store = FlashConfigStore::new(Flash::new_blocking(p.FLASH));
    let config = load_config(&mut store, default_config());
    info!(
        "capture {} bytes at {} baud, request {=[u8]:x}, terminator {=[u8]:x}",
        config.capture_len(),
        config.baud_rate(),
        config.request_command(),
        config.terminator()
    );

    // --- UART Setup ---
    let uart = Uart::new(
        p.UART1,
        p.PIN_8, // TX
        p.PIN_9, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        instrument_uart_config(config.baud_rate()),
    );
    let (tx, rx) = uart.split();
    let serial = UartSerial::new(tx, rx);

    let trigger = Input::new(p.PIN_15, Pull::Up);
    let handoff: &'static Handoff = HANDOFF.init(FrameHandoff::new(config));
    let machine = CaptureMachine::new(serial, trigger, Delay, TRIGGER_EDGE);

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x1209, 0x0001); // pid.codes test VID/PID
    usb_config.manufacturer = Some("Rust Keywedge");
    usb_config.product = Some("Serial Keyboard Wedge");
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    // Configure HID class
    let hid_state = HID_STATE.init(State::new());
    let hid_writer = configure_usb_keyboard(&mut builder, hid_state);

    // Build the USB device
    let usb_device = builder.build();
    let keyboard = UsbKeyboard::new(hid_writer);

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(capture_task(machine, handoff).unwrap());
    spawner.spawn(dispatch_task(keyboard, handoff).unwrap());

    info!("Serial keyboard wedge initialized, waiting for trigger...");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

/// Capture task - samples the trigger and publishes frames.
#[embassy_executor::task]
async fn capture_task(mut machine: Capture, handoff: &'static Handoff) {
    let err = machine.run(handoff).await;
    error!("Capture stopped: {:?}, resetting", err);
    cortex_m::peripheral::SCB::sys_reset();
}

/// Dispatch task - types ready frames on the USB keyboard.
#[embassy_executor::task]
async fn dispatch_task(mut keyboard: UsbKeyboard<'static>, handoff: &'static Handoff) {
    // Wait for USB to be ready
    keyboard.wait_ready().await;
    info!("USB keyboard ready, dispatching frames...");

    let mut dispatcher = Dispatcher::new(keyboard, UsLayout, Delay);
    dispatcher.run(handoff).await
}
