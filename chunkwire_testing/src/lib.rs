//! Test support for `chunkwire`.
//!
//! Provides a small self-describing value codec so engine tests can exercise
//! invoke, notify, and shared-object payloads without a production
//! serialization stack. The wire shape is deliberately simple: a one-byte
//! tag followed by a fixed or length-prefixed body.

use bytes::{BufMut, BytesMut};
use chunkwire::buffer::ByteCursor;
use chunkwire::value::{ValueCodec, ValueCodecError};

const TAG_NULL: u8 = 0x00;
const TAG_BOOLEAN: u8 = 0x01;
const TAG_NUMBER: u8 = 0x02;
const TAG_TEXT: u8 = 0x03;
const TAG_LIST: u8 = 0x04;
const TAG_MAP: u8 = 0x05;

/// Dynamically shaped value for tests.
#[derive(Clone, Debug, PartialEq)]
pub enum TestValue {
    /// Absent / null.
    Null,
    /// Boolean flag.
    Boolean(bool),
    /// Double-precision number.
    Number(f64),
    /// UTF-8 text.
    Text(String),
    /// Ordered list of values.
    List(Vec<TestValue>),
    /// Ordered string-keyed pairs.
    Map(Vec<(String, TestValue)>),
}

impl From<&str> for TestValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<f64> for TestValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for TestValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Tagged binary codec over [`TestValue`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TestCodec;

impl TestCodec {
    fn read_tagged(cursor: &mut ByteCursor<'_>) -> Result<TestValue, ValueCodecError> {
        let tag = cursor.get_u8().ok_or(ValueCodecError::Truncated)?;
        match tag {
            TAG_NULL => Ok(TestValue::Null),
            TAG_BOOLEAN => {
                let flag = cursor.get_u8().ok_or(ValueCodecError::Truncated)?;
                Ok(TestValue::Boolean(flag != 0))
            }
            TAG_NUMBER => {
                let number = cursor.get_f64().ok_or(ValueCodecError::Truncated)?;
                Ok(TestValue::Number(number))
            }
            TAG_TEXT => Ok(TestValue::Text(Self::read_raw_string(cursor)?)),
            TAG_LIST => {
                let count = cursor.get_u32().ok_or(ValueCodecError::Truncated)?;
                let mut list = Vec::new();
                for _ in 0..count {
                    list.push(Self::read_tagged(cursor)?);
                }
                Ok(TestValue::List(list))
            }
            TAG_MAP => {
                let count = cursor.get_u32().ok_or(ValueCodecError::Truncated)?;
                let mut map = Vec::new();
                for _ in 0..count {
                    let key = Self::read_raw_string(cursor)?;
                    map.push((key, Self::read_tagged(cursor)?));
                }
                Ok(TestValue::Map(map))
            }
            _ => Err(ValueCodecError::Malformed {
                reason: "unknown value tag",
            }),
        }
    }

    fn read_raw_string(cursor: &mut ByteCursor<'_>) -> Result<String, ValueCodecError> {
        let len = cursor.get_u16().ok_or(ValueCodecError::Truncated)?;
        let bytes = cursor
            .take(usize::from(len))
            .ok_or(ValueCodecError::Truncated)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ValueCodecError::Malformed {
            reason: "string is not valid UTF-8",
        })
    }

    fn write_tagged(out: &mut BytesMut, value: &TestValue) -> Result<(), ValueCodecError> {
        match value {
            TestValue::Null => out.put_u8(TAG_NULL),
            TestValue::Boolean(flag) => {
                out.put_u8(TAG_BOOLEAN);
                out.put_u8(u8::from(*flag));
            }
            TestValue::Number(number) => {
                out.put_u8(TAG_NUMBER);
                out.put_f64(*number);
            }
            TestValue::Text(text) => {
                out.put_u8(TAG_TEXT);
                Self::write_raw_string(out, text)?;
            }
            TestValue::List(list) => {
                out.put_u8(TAG_LIST);
                out.put_u32(u32::try_from(list.len()).map_err(|_| ValueCodecError::Malformed {
                    reason: "list too long",
                })?);
                for item in list {
                    Self::write_tagged(out, item)?;
                }
            }
            TestValue::Map(map) => {
                out.put_u8(TAG_MAP);
                out.put_u32(u32::try_from(map.len()).map_err(|_| ValueCodecError::Malformed {
                    reason: "map too long",
                })?);
                for (key, item) in map {
                    Self::write_raw_string(out, key)?;
                    Self::write_tagged(out, item)?;
                }
            }
        }
        Ok(())
    }

    fn write_raw_string(out: &mut BytesMut, text: &str) -> Result<(), ValueCodecError> {
        let len = u16::try_from(text.len()).map_err(|_| ValueCodecError::Malformed {
            reason: "string too long",
        })?;
        out.put_u16(len);
        out.put_slice(text.as_bytes());
        Ok(())
    }
}

impl ValueCodec for TestCodec {
    type Value = TestValue;

    fn read_value(&self, cursor: &mut ByteCursor<'_>) -> Result<TestValue, ValueCodecError> {
        Self::read_tagged(cursor)
    }

    fn read_bare_string(&self, cursor: &mut ByteCursor<'_>) -> Result<String, ValueCodecError> {
        Self::read_raw_string(cursor)
    }

    fn write_value(&self, out: &mut BytesMut, value: &TestValue) -> Result<(), ValueCodecError> {
        Self::write_tagged(out, value)
    }

    fn write_bare_string(&self, out: &mut BytesMut, value: &str) -> Result<(), ValueCodecError> {
        Self::write_raw_string(out, value)
    }

    fn write_string_value(&self, out: &mut BytesMut, value: &str) -> Result<(), ValueCodecError> {
        out.put_u8(TAG_TEXT);
        Self::write_raw_string(out, value)
    }

    fn write_number_value(&self, out: &mut BytesMut, value: f64) -> Result<(), ValueCodecError> {
        out.put_u8(TAG_NUMBER);
        out.put_f64(value);
        Ok(())
    }

    fn write_null_value(&self, out: &mut BytesMut) -> Result<(), ValueCodecError> {
        out.put_u8(TAG_NULL);
        Ok(())
    }

    fn as_number(value: &TestValue) -> Option<f64> {
        match value {
            TestValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    fn into_string(value: TestValue) -> Option<String> {
        match value {
            TestValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use chunkwire::buffer::ByteCursor;
    use chunkwire::value::ValueCodec;

    use super::{TestCodec, TestValue};

    #[test]
    fn values_round_trip() {
        let value = TestValue::Map(vec![
            ("app".to_owned(), TestValue::from("demo")),
            ("ready".to_owned(), TestValue::from(true)),
            (
                "scores".to_owned(),
                TestValue::List(vec![TestValue::from(1.0), TestValue::Null]),
            ),
        ]);

        let mut wire = BytesMut::new();
        TestCodec.write_value(&mut wire, &value).expect("writable value");
        let mut cursor = ByteCursor::new(&wire);
        let decoded = TestCodec.read_value(&mut cursor).expect("readable value");

        assert_eq!(decoded, value);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn bare_strings_round_trip_without_a_tag() {
        let mut wire = BytesMut::new();
        TestCodec
            .write_bare_string(&mut wire, "attribute")
            .expect("writable string");
        assert_eq!(wire[0..2], [0x00, 0x09]);

        let mut cursor = ByteCursor::new(&wire);
        let text = TestCodec.read_bare_string(&mut cursor).expect("readable string");
        assert_eq!(text, "attribute");
    }
}
