//! # SSM2603 Driver
//!
//! This is a driver for the Analog Devices SSM2603 audio CODEC.
//!
//! Specifically, this driver brings the SSM2603 out of its power-on state by
//! writing a fixed sequence of control registers over I²C - it does not
//! handle the digital audio interface (I²S, or similar), and it does not
//! reconfigure the device after bring-up.
//!
//! The SSM2603 control port is *write-only* - no register contents can be
//! read back, and the device never reports its state. The order of the
//! bring-up writes is therefore the only thing encoding the register
//! dependencies (the core clock must be programmed and allowed to settle
//! before the digital core is activated), and [`Codec::bring_up`] preserves
//! that order exactly, including the one mandatory settling delay after the
//! sampling-rate register is written.
//!
//! Writes are fire-and-forget: a write the device does not acknowledge is
//! never retried and never stops the sequence. The aggregate of any failed
//! writes is reported to the caller afterwards so they are not silently
//! swallowed.
//!
//! # Example
//!
//! You might bring the CODEC up like this:
//!
//! ```rust
//! # use embedded_hal::blocking::delay::DelayUs;
//! # use embedded_hal::blocking::i2c::Write;
//! # struct I2c;
//! # impl embedded_hal::blocking::i2c::Write for I2c {
//! #     type Error = ();
//! #     fn write(&mut self, address: embedded_hal::blocking::i2c::SevenBitAddress, bytes: &[u8]) -> Result<(), Self::Error> {
//! #         Ok(())
//! #     }
//! # }
//! # struct Delay;
//! # impl embedded_hal::blocking::delay::DelayUs<u16> for Delay {
//! #     fn delay_us(&mut self, _us: u16) {}
//! # }
//! # let mut i2c = I2c;
//! # let mut delay = Delay;
//! let codec = ssm2603::Codec::new(ssm2603::BusAddress::CsbLow);
//! if let Err(e) = codec.bring_up(&mut i2c, &mut delay) {
//!     // Some writes went unacknowledged - the CODEC may be partly configured
//! }
//! ```
//!
//! Initialising the I²C peripheral itself is the HAL's job; if that fails,
//! abandon the bring-up before constructing anything here - the [`Codec`]
//! must only ever see a working bus.

#![no_std]
#![deny(unsafe_code)]
#![deny(missing_docs)]

//
// Public Types
//

/// The SSM2603 has one of two I²C addresses, depending on whether the CSB
/// pin is pulled high or low.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BusAddress {
    /// The address when the CSB pin is high
    CsbHigh = 0x1B,
    /// The address when the CSB pin is low
    CsbLow = 0x1A,
}

/// Reports the register writes that went unacknowledged during
/// [`Codec::bring_up`].
///
/// This is a diagnostic, not an abort: by the time you see it, every write in
/// the sequence has already been attempted. The SSM2603 cannot be queried, so
/// the only recourse is usually to reset and run the bring-up again.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BringUpError<E> {
    /// How many of the writes in the sequence failed
    pub failed_writes: u8,
    /// The transport error from the first write that failed
    pub first_error: E,
}

/// Proxy object for an SSM2603 CODEC on an I²C bus.
pub struct Codec {
    bus_address: u8,
}

//
// Private Types
//

/// The set of control registers in the SSM2603
#[derive(Copy, Clone, Debug)]
enum Register {
    LeftAdcInputVolume = 0x00,
    RightAdcInputVolume = 0x01,
    LeftDacVolume = 0x02,
    RightDacVolume = 0x03,
    AnalogAudioPath = 0x04,
    DigitalAudioPath = 0x05,
    PowerManagement = 0x06,
    DigitalAudioInterface = 0x07,
    SamplingRate = 0x08,
    Active = 0x09,
    SoftwareReset = 0x0F,
}

/// One entry in the bring-up sequence: a register write, optionally followed
/// by the settling delay.
#[derive(Copy, Clone)]
struct Step {
    register: Register,
    value: u16,
    settle: bool,
}

//
// Private Data
//

/// Power-down bit for the crystal oscillator in the PowerManagement register.
///
/// A set bit powers the block *down* (it's the power-down register).
const PWR_OSC: u16 = 1 << 5;
/// Power-down bit for the CLKOUT pin driver in the PowerManagement register.
const PWR_CLKOUT: u16 = 1 << 6;
/// Power-down bit for the line/headphone outputs in the PowerManagement
/// register.
const PWR_OUT: u16 = 1 << 4;

/// How long the CODEC needs to settle after the sampling-rate register is
/// programmed, before the digital core may be activated.
///
/// This is a hardware requirement, not a tuning knob.
const SETTLE_TIME_US: u16 = 1_000;

/// The power-on configuration writes, in required order.
///
/// Order is load-bearing throughout: the outputs are held off while the
/// clocking and audio path are set up, the digital core is only activated
/// once the sampling-rate settings have settled, and the outputs come on
/// last.
const BRING_UP_SEQUENCE: [Step; 11] = [
    // PowerManagement - CLKOUT, oscillator and outputs held off, everything else on
    Step::write(Register::PowerManagement, PWR_CLKOUT | PWR_OSC | PWR_OUT),
    // LeftAdcInputVolume - Left Input 0dB, unmuted
    Step::write(Register::LeftAdcInputVolume, 0b0_0001_0111),
    // RightAdcInputVolume - Right Input 0dB, unmuted
    Step::write(Register::RightAdcInputVolume, 0b0_0001_0111),
    // LeftDacVolume - Left Output 0dB, zero-cross enabled
    Step::write(Register::LeftDacVolume, 0b0_0111_1001),
    // RightDacVolume - Right Output 0dB, zero-cross enabled
    Step::write(Register::RightDacVolume, 0b0_0111_1001),
    // AnalogAudioPath - DAC selected, line input to ADC, mic muted
    Step::write(Register::AnalogAudioPath, 0b0_0001_0010),
    // DigitalAudioPath - DAC unmuted, de-emphasis disabled
    Step::write(Register::DigitalAudioPath, 0b0_0000_0000),
    // DigitalAudioInterface - Slave mode, 16-bit, left-justified
    Step::write(Register::DigitalAudioInterface, 0b0_0000_0001),
    // SamplingRate - 44.1 kHz from an 11.2896 MHz MCLK, non-USB mode.
    // Note the BOSR bit disagrees with the datasheet's 256fs table for this
    // rate; the value is kept bit-for-bit because it is the known-good
    // sequence for this board, and the write-only port leaves no way to
    // confirm which reading the silicon prefers.
    Step::write_then_settle(Register::SamplingRate, 0b0_0010_0010),
    // Active - digital core activated
    Step::write(Register::Active, 0b0_0000_0001),
    // PowerManagement - CLKOUT and oscillator stay off, outputs now on
    Step::write(Register::PowerManagement, PWR_CLKOUT | PWR_OSC),
];

//
// Public Functions
//

/// Pack a register address and value into the SSM2603's 2-byte wire format.
///
/// Byte 0 carries the 7-bit register address in its upper bits with bit 8 of
/// the value folded into bit 0; byte 1 carries the low 8 bits of the value.
///
/// # Preconditions
///
/// `register` must fit in 7 bits and `value` must fit in 9 bits. Both are
/// checked in debug builds; in release builds the output for out-of-range
/// input is undefined (the caller is expected to pass fixed, known-good
/// constants, as [`Codec`] does).
pub fn frame(register: u8, value: u16) -> [u8; 2] {
    debug_assert!(register < 0x80, "register address must fit in 7 bits");
    debug_assert!(value < 0x200, "register value must fit in 9 bits");
    let byte1 = (register << 1) | ((value >> 8) & 1) as u8;
    let byte2 = (value & 0xFF) as u8;
    [byte1, byte2]
}

//
// impls on Public Types
//

impl From<BusAddress> for u8 {
    fn from(addr: BusAddress) -> u8 {
        addr as u8
    }
}

impl Codec {
    /// Create a new SSM2603 CODEC proxy object.
    ///
    /// Nothing touches the bus until you call [`Codec::bring_up`] (or
    /// [`Codec::reset`]).
    pub fn new(bus_address: BusAddress) -> Codec {
        Codec {
            bus_address: bus_address.into(),
        }
    }

    /// Run the power-on configuration sequence.
    ///
    /// Writes every register in the fixed bring-up order over `bus`,
    /// suspending for 1 ms via `delay` after the sampling-rate register so
    /// the core clock can settle before the digital core is activated.
    ///
    /// Each write is attempted exactly once and a failed write does not stop
    /// the sequence - the SSM2603 cannot report its state, so there is
    /// nothing useful to do mid-sequence with a missing acknowledge. If any
    /// writes failed, the count and the first transport error come back as a
    /// [`BringUpError`] once the whole sequence has run.
    pub fn bring_up<B, D>(&self, bus: &mut B, delay: &mut D) -> Result<(), BringUpError<B::Error>>
    where
        B: embedded_hal::blocking::i2c::Write,
        D: embedded_hal::blocking::delay::DelayUs<u16>,
    {
        let mut failure: Option<BringUpError<B::Error>> = None;
        for step in &BRING_UP_SEQUENCE {
            let buffer = frame(step.register as u8, step.value);
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "Setting SSM2603 0x{:02x} to 0x{:03x}",
                step.register as u8,
                step.value
            );
            if let Err(e) = bus.write(self.bus_address, &buffer) {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "SSM2603 write to 0x{:02x} not acknowledged",
                    step.register as u8
                );
                match failure.as_mut() {
                    Some(f) => f.failed_writes += 1,
                    None => {
                        failure = Some(BringUpError {
                            failed_writes: 1,
                            first_error: e,
                        })
                    }
                }
            }
            if step.settle {
                delay.delay_us(SETTLE_TIME_US);
            }
        }
        match failure {
            Some(f) => Err(f),
            None => Ok(()),
        }
    }

    /// Reset the SSM2603, putting all the registers back to their power-on
    /// defaults.
    ///
    /// Not part of the bring-up sequence; useful for starting over when
    /// [`Codec::bring_up`] reported failed writes.
    pub fn reset<B>(&self, bus: &mut B) -> Result<(), B::Error>
    where
        B: embedded_hal::blocking::i2c::Write,
    {
        let buffer = frame(Register::SoftwareReset as u8, 0);
        bus.write(self.bus_address, &buffer)
    }
}

//
// impls on Private Types
//

impl Step {
    const fn write(register: Register, value: u16) -> Step {
        Step {
            register,
            value,
            settle: false,
        }
    }

    const fn write_then_settle(register: Register, value: u16) -> Step {
        Step {
            register,
            value,
            settle: true,
        }
    }
}

//
// End of file
//
