//! UART text console
//!
//! Line-oriented output for user messages and for text printed by loaded
//! code. Lines end in CRLF so plain serial terminals render them.

use core::fmt;

use palimpsest_hal::UartTx;

/// Text console on a UART transmitter
pub struct UartConsole<U> {
    uart: U,
}

impl<U: UartTx> UartConsole<U> {
    pub fn new(uart: U) -> Self {
        Self { uart }
    }

    /// Write raw bytes, replacing anything non-printable with `?`
    ///
    /// Used for text handed over by loaded code, which is not guaranteed
    /// to be UTF-8.
    pub fn write_bytes_lossy(&mut self, bytes: &[u8]) -> Result<(), U::Error> {
        for chunk in bytes.chunks(32) {
            let mut out = [0u8; 32];
            for (dst, &b) in out.iter_mut().zip(chunk) {
                *dst = if b.is_ascii_graphic() || matches!(b, b' ' | b'\r' | b'\n' | b'\t') {
                    b
                } else {
                    b'?'
                };
            }
            self.uart.write_blocking(&out[..chunk.len()])?;
        }
        Ok(())
    }

    /// Write `text` followed by CRLF and flush
    pub fn write_line(&mut self, text: &str) -> Result<(), U::Error> {
        self.uart.write_blocking(text.as_bytes())?;
        self.uart.write_blocking(b"\r\n")?;
        self.uart.flush()
    }

    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }
}

impl<U: UartTx> fmt::Write for UartConsole<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.uart.write_blocking(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    #[derive(Default)]
    struct MockUart {
        sent: Vec<u8>,
        flushes: usize,
    }

    impl UartTx for MockUart {
        type Error = ();

        fn write_blocking(&mut self, data: &[u8]) -> Result<(), ()> {
            self.sent.extend_from_slice(data);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_write_line_appends_crlf() {
        let mut console = UartConsole::new(MockUart::default());
        console.write_line("Selected module 2").unwrap();
        assert_eq!(console.uart.sent, b"Selected module 2\r\n");
        assert_eq!(console.uart.flushes, 1);
    }

    #[test]
    fn test_lossy_bytes() {
        let mut console = UartConsole::new(MockUart::default());
        console.write_bytes_lossy(b"ok\x00\xffend\n").unwrap();
        assert_eq!(console.uart.sent, b"ok??end\n");
    }

    #[test]
    fn test_fmt_write() {
        let mut console = UartConsole::new(MockUart::default());
        write!(console, "temp={}", -12).unwrap();
        assert_eq!(console.uart.sent, b"temp=-12");
    }
}
