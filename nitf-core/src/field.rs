//! This contains the [`Field`] primitive which every header and subheader is built from.
//!
//! A NITF header is a strict concatenation of fixed-width fields, each with a
//! declared character class. [`Field`] keeps the exact on-disk bytes so that a
//! record can be written back bit-for-bit, and offers typed setters and getters
//! which re-validate the class on every mutation.
use crate::enums::CharClass;
use crate::errors::*;

use num_traits::ToPrimitive;
use std::convert::TryInto;

/// A single fixed-width header field holding its exact on-disk bytes.
///
/// ```
/// use nitf_core::enums::CharClass;
/// use nitf_core::field::Field;
///
/// let mut f = Field::new(10, CharClass::BcsA);
/// f.set_string("GEOCENTRE").unwrap();
/// assert_eq!(f.raw(), b"GEOCENTRE ");
/// assert_eq!(f.as_string(), "GEOCENTRE");
///
/// let mut n = Field::new(5, CharClass::BcsN);
/// n.set_uint(42u32).unwrap();
/// assert_eq!(n.raw(), b"00042");
/// assert_eq!(n.as_u64().unwrap(), 42);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    data: Vec<u8>,
    class: CharClass,
    resizable: bool,
}

impl Field {
    /// Create a field of a fixed width, filled with the class pad byte
    /// (`0` for numeric classes, space otherwise, NUL for binary).
    pub fn new(length: usize, class: CharClass) -> Self {
        let pad = match class {
            CharClass::BcsN | CharClass::BcsNPlus => b'0',
            CharClass::Binary => 0u8,
            _ => b' ',
        };
        Field {
            data: vec![pad; length],
            class,
            resizable: false,
        }
    }

    /// Create an empty field whose width follows its content. Used for the
    /// variable-length parts of a subheader (TRE payloads, LUT data).
    pub fn resizable(class: CharClass) -> Self {
        Field {
            data: Vec::new(),
            class,
            resizable: true,
        }
    }

    /// Create a field from on-disk bytes without validating the class. Used
    /// by best-effort parsing, which records the violation as a warning but
    /// keeps the bytes.
    pub fn from_bytes_unchecked(bytes: &[u8], class: CharClass) -> Self {
        Field {
            data: bytes.to_vec(),
            class,
            resizable: false,
        }
    }

    /// Create a field directly from on-disk bytes, validating the class.
    pub fn from_bytes(bytes: &[u8], class: CharClass) -> Result<Self, NitfError> {
        if !class.validate(bytes) {
            return Err(NitfError::WrongClass {
                field: String::new(),
                class,
            });
        }
        Ok(Field {
            data: bytes.to_vec(),
            class,
            resizable: false,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn class(&self) -> CharClass {
        self.class
    }

    /// The exact on-disk bytes of the field.
    pub fn raw(&self) -> &[u8] {
        &self.data
    }

    /// True when the field contains only pad characters (all spaces or all
    /// zeros), which the enclosing schema treats as "unset".
    pub fn is_blank(&self) -> bool {
        if self.class == CharClass::Binary {
            return self.data.iter().all(|b| *b == 0);
        }
        self.data.iter().all(|b| *b == b' ') || self.data.iter().all(|b| *b == b'0')
    }

    /// Change the width of the field, truncating or padding on the right.
    /// Used when converting a record between versions.
    pub fn resize(&mut self, length: usize) {
        let pad = match self.class {
            CharClass::BcsN | CharClass::BcsNPlus => b'0',
            CharClass::Binary => 0u8,
            _ => b' ',
        };
        self.data.resize(length, pad);
    }

    /// Replace the field content with raw bytes. The length must match the
    /// field width unless the field is resizable. The class is re-validated.
    pub fn set_raw(&mut self, bytes: &[u8]) -> Result<(), NitfError> {
        if !self.resizable && bytes.len() != self.data.len() {
            return Err(NitfError::Truncation {
                field: String::new(),
                width: self.data.len(),
                needed: bytes.len(),
            });
        }
        if !self.class.validate(bytes) {
            return Err(NitfError::WrongClass {
                field: String::new(),
                class: self.class,
            });
        }
        self.data = bytes.to_vec();
        Ok(())
    }

    /// Set from a string. Alpha classes are left-justified and space padded,
    /// numeric classes right-justified and zero padded.
    pub fn set_string(&mut self, s: &str) -> Result<(), NitfError> {
        let bytes = s.as_bytes();
        if self.resizable {
            return self.set_raw(bytes);
        }
        if bytes.len() > self.data.len() {
            return Err(NitfError::Truncation {
                field: String::new(),
                width: self.data.len(),
                needed: bytes.len(),
            });
        }
        if !self.class.validate(bytes) {
            return Err(NitfError::WrongClass {
                field: String::new(),
                class: self.class,
            });
        }
        let width = self.data.len();
        if self.class.is_numeric() {
            for b in self.data.iter_mut() {
                *b = b'0';
            }
            self.data[width - bytes.len()..].copy_from_slice(bytes);
        } else {
            for b in self.data.iter_mut() {
                *b = b' ';
            }
            self.data[..bytes.len()].copy_from_slice(bytes);
        }
        Ok(())
    }

    /// Set from a signed integer, right-justified and zero padded.
    pub fn set_int<T: ToPrimitive>(&mut self, v: T) -> Result<(), NitfError> {
        let v = v.to_i64().ok_or_else(|| NitfError::Parse {
            field: String::new(),
            value: "non-integral value".to_string(),
        })?;
        self.set_numeric_string(v.to_string())
    }

    /// Set from an unsigned integer, right-justified and zero padded.
    pub fn set_uint<T: ToPrimitive>(&mut self, v: T) -> Result<(), NitfError> {
        let v = v.to_u64().ok_or_else(|| NitfError::Parse {
            field: String::new(),
            value: "non-integral value".to_string(),
        })?;
        self.set_numeric_string(v.to_string())
    }

    /// Set from a real value. The field width dictates the precision; the
    /// fractional part is trimmed until the value fits.
    pub fn set_real(&mut self, v: f64) -> Result<(), NitfError> {
        let width = self.data.len();
        for precision in (0..=width).rev() {
            let s = format!("{:.*}", precision, v);
            if s.len() <= width {
                return self.set_numeric_string(s);
            }
        }
        Err(NitfError::Truncation {
            field: String::new(),
            width,
            needed: format!("{}", v).len(),
        })
    }

    fn set_numeric_string(&mut self, s: String) -> Result<(), NitfError> {
        if self.resizable {
            return self.set_raw(s.as_bytes());
        }
        if s.len() > self.data.len() {
            return Err(NitfError::Truncation {
                field: String::new(),
                width: self.data.len(),
                needed: s.len(),
            });
        }
        if !self.class.validate(s.as_bytes()) {
            return Err(NitfError::WrongClass {
                field: String::new(),
                class: self.class,
            });
        }
        let width = self.data.len();
        for b in self.data.iter_mut() {
            *b = b'0';
        }
        // A sign stays in front of the zero padding so the value reads back.
        let (sign, digits) = match s.as_bytes().first() {
            Some(b'+') | Some(b'-') => s.as_bytes().split_at(1),
            _ => (&[] as &[u8], s.as_bytes()),
        };
        if let Some(sign) = sign.first() {
            self.data[0] = *sign;
        }
        self.data[width - digits.len()..].copy_from_slice(digits);
        Ok(())
    }

    /// Get the content as a string with the class padding trimmed away.
    pub fn as_string(&self) -> String {
        let s = String::from_utf8_lossy(&self.data);
        if self.class.is_numeric() {
            s.trim().to_string()
        } else {
            s.trim_end().to_string()
        }
    }

    /// Read the field as a signed integer. Binary fields of 1, 2, 4 or 8
    /// bytes are interpreted big-endian; character fields are parsed.
    pub fn as_i64(&self) -> Result<i64, NitfError> {
        if self.class == CharClass::Binary {
            return Ok(self.binary_u64()? as i64);
        }
        let s = self.as_string();
        if s.is_empty() {
            return Ok(0);
        }
        s.parse().map_err(|_| NitfError::Parse {
            field: String::new(),
            value: s,
        })
    }

    /// Read the field as an unsigned integer.
    pub fn as_u64(&self) -> Result<u64, NitfError> {
        if self.class == CharClass::Binary {
            return self.binary_u64();
        }
        let s = self.as_string();
        if s.is_empty() {
            return Ok(0);
        }
        s.parse().map_err(|_| NitfError::Parse {
            field: String::new(),
            value: s,
        })
    }

    /// Read the field as a real value.
    pub fn as_f64(&self) -> Result<f64, NitfError> {
        let s = self.as_string();
        if s.is_empty() {
            return Ok(0.0);
        }
        s.parse().map_err(|_| NitfError::Parse {
            field: String::new(),
            value: s,
        })
    }

    fn binary_u64(&self) -> Result<u64, NitfError> {
        match self.data.len() {
            1 => Ok(self.data[0] as u64),
            2 => Ok(u16::from_be_bytes(self.data[..].try_into()?) as u64),
            4 => Ok(u32::from_be_bytes(self.data[..].try_into()?) as u64),
            8 => Ok(u64::from_be_bytes(self.data[..].try_into()?)),
            l => Err(NitfError::Parse {
                field: String::new(),
                value: format!("{}-byte binary field", l),
            }),
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.class == CharClass::Binary {
            for b in &self.data {
                write!(f, "{:02x}", b)?;
            }
            Ok(())
        } else {
            write!(f, "{}", String::from_utf8_lossy(&self.data))
        }
    }
}
