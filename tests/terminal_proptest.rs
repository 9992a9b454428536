//! Property-based tests for the terminal loop.
//! Any byte stream is survived, every line gets exactly one reply, and text
//! advances the cursor one column per character.

use proptest::prelude::*;
use usb_oled::{I2cTransport, Interface, MemoryStorage, Terminal, TerminalConfig};

/// Bus that acknowledges everything
#[derive(Debug)]
struct NullBus;

impl I2cTransport for NullBus {
    type Error = core::convert::Infallible;

    fn start(&mut self, _address: u8) -> Result<(), Self::Error> {
        Ok(())
    }

    fn write_byte(&mut self, _value: u8) -> Result<(), Self::Error> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Mostly protocol bytes, with an occasional long run
fn traffic() -> impl Strategy<Value = Vec<u8>> {
    let byte = prop_oneof![
        4 => any::<u8>(),
        2 => Just(b'\t'),
        2 => Just(b'\n'),
        1 => Just(b'\r'),
        2 => prop::sample::select(b"@^#*$=%?sgGcCmV0123456789ABCDEF".to_vec()),
    ];
    prop::collection::vec(byte, 0..600)
}

fn terminal() -> Terminal<Interface<NullBus>, MemoryStorage> {
    Terminal::new(
        Interface::new(NullBus, 0x3C),
        MemoryStorage::new(),
        TerminalConfig::default(),
    )
}

proptest::proptest! {
    /// Printable text moves the column by its length, clamped at the row end.
    #[test]
    fn column_advances_per_printable_byte(text in prop::collection::vec(0x20u8..=0x7E, 1..40)) {
        let mut terminal = terminal();
        prop_assert!(terminal.start().is_ok());
        let columns = terminal.display().columns();

        let mut line = text.clone();
        line.push(b'\n');
        terminal.receive(&line);
        terminal.process();

        let mut reply = [0; 8];
        let count = terminal.transmit(&mut reply);
        let fits = text.len() <= usize::from(columns);
        prop_assert_eq!(&reply[..count], if fits { &b"\n"[..] } else { &b"!\n"[..] });
        let expected = text.len().min(usize::from(columns)) as u8;
        prop_assert_eq!(terminal.display().cursor(), (0, expected));
    }

    /// Every LF received produces exactly one LF in the reply.
    #[test]
    fn one_reply_per_line(bytes in traffic()) {
        let mut terminal = terminal();
        prop_assert!(terminal.start().is_ok());

        let mut reply = Vec::new();
        let mut chunk = [0; 64];
        for byte in &bytes {
            terminal.receive(core::slice::from_ref(byte));
            terminal.process();
            loop {
                let count = terminal.transmit(&mut chunk);
                if count == 0 {
                    break;
                }
                reply.extend_from_slice(&chunk[..count]);
            }
        }

        let lines = bytes.iter().filter(|&&b| b == b'\n').count();
        let replies = reply.iter().filter(|&&b| b == b'\n').count();
        prop_assert_eq!(replies, lines);
        prop_assert!(terminal.pending_input() <= 192);
    }
}
