//! Property-based tests for the hex argument codec.

use proptest::prelude::*;
use usb_oled::HexError;
use usb_oled::hex::{decode_into, encode_byte, hex_to_nibble};

proptest::proptest! {
    /// Exactly the ASCII hex digits have a nibble value.
    #[test]
    fn nibble_defined_for_hex_digits_only(digit in any::<u8>()) {
        prop_assert_eq!(hex_to_nibble(digit).is_some(), digit.is_ascii_hexdigit());
    }

    /// Lower and upper case digits decode to the same bytes.
    #[test]
    fn decoding_ignores_case(bytes in prop::collection::vec(any::<u8>(), 0..16)) {
        let upper: Vec<u8> = bytes.iter().flat_map(|&b| encode_byte(b)).collect();
        let lower = upper.to_ascii_lowercase();

        let mut from_upper = [0; 16];
        let mut from_lower = [0; 16];
        prop_assert_eq!(decode_into(&upper, &mut from_upper), Ok(bytes.len()));
        prop_assert_eq!(decode_into(&lower, &mut from_lower), Ok(bytes.len()));
        prop_assert_eq!(&from_upper[..bytes.len()], &bytes[..]);
        prop_assert_eq!(from_upper, from_lower);
    }

    /// Rejected input leaves the output untouched.
    #[test]
    fn rejected_input_writes_nothing(src in prop::collection::vec(any::<u8>(), 0..40)) {
        let mut out = [0xEE; 16];
        match decode_into(&src, &mut out) {
            Ok(count) => {
                prop_assert!(src.iter().all(u8::is_ascii_hexdigit));
                prop_assert_eq!(count, src.len() / 2);
            }
            Err(HexError::OddLength) => {
                prop_assert!(src.len() % 2 == 1);
                prop_assert_eq!(out, [0xEE; 16]);
            }
            Err(_) => prop_assert_eq!(out, [0xEE; 16]),
        }
    }
}
