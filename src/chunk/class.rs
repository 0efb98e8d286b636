//! Header compression classes.

use crate::error::ProtocolError;

/// The four header-compression levels, carried in the top two bits of a
/// chunk's first byte.
///
/// Smaller classes borrow the missing fields from the channel's previous
/// header; [`HeaderClass::Continue`] borrows everything and consists of the
/// channel marker alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HeaderClass {
    /// Full header: timestamp, size, type, and stream id all explicit.
    New = 0x00,
    /// Same stream id as the previous header on the channel.
    SameSource = 0x01,
    /// Only the timestamp changed; size, type, and stream id are borrowed.
    TimerChange = 0x02,
    /// Entire header borrowed from the previous one on the channel.
    Continue = 0x03,
}

impl HeaderClass {
    /// Wire code stored in the class bits.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up a class by its wire code.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownHeaderClass`] for codes above 3. The
    /// `channel` is only used to annotate the error.
    pub const fn from_code(code: u8, channel: u32) -> Result<Self, ProtocolError> {
        match code {
            0x00 => Ok(Self::New),
            0x01 => Ok(Self::SameSource),
            0x02 => Ok(Self::TimerChange),
            0x03 => Ok(Self::Continue),
            _ => Err(ProtocolError::UnknownHeaderClass { channel, code }),
        }
    }

    /// Length in bytes of the header body following the channel marker.
    #[must_use]
    pub const fn body_len(self) -> usize {
        match self {
            Self::New => 11,
            Self::SameSource => 7,
            Self::TimerChange => 3,
            Self::Continue => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::HeaderClass;

    #[rstest]
    #[case(HeaderClass::New, 0x00, 11)]
    #[case(HeaderClass::SameSource, 0x01, 7)]
    #[case(HeaderClass::TimerChange, 0x02, 3)]
    #[case(HeaderClass::Continue, 0x03, 0)]
    fn codes_and_body_lengths(#[case] class: HeaderClass, #[case] code: u8, #[case] body: usize) {
        assert_eq!(class.code(), code);
        assert_eq!(class.body_len(), body);
        assert_eq!(HeaderClass::from_code(code, 3).expect("defined code"), class);
    }

    #[test]
    fn undefined_codes_are_rejected() {
        assert!(HeaderClass::from_code(0x04, 9).is_err());
    }
}
