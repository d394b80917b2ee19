use crate::enums::{CharClass, SegmentKind};

/// Basic Error types.
#[derive(Debug)]
pub enum NitfError {
    /// TryFromSliceError from the std library.
    TryFromSlice(std::array::TryFromSliceError),
    /// FromUtf8Error from the std library.
    TryFromUtf8(std::string::FromUtf8Error),
    /// IoError from the std library.
    StdIoError(std::io::Error),
    /// The first nine bytes are not a recognised NITF/NSIF version string.
    NotNitf { magic: String },
    /// Field content violates its declared character class.
    WrongClass { field: String, class: CharClass },
    /// A value is too wide for the field that should hold it.
    Truncation {
        field: String,
        width: usize,
        needed: usize,
    },
    /// A numeric or date field could not be read as a number/date.
    Parse { field: String, value: String },
    /// Unexpected end of data on the I/O interface.
    Eof,
    /// A seek was requested on an interface that cannot seek.
    NotSeekable,
    /// Offsets, counts or block geometry are internally inconsistent.
    Structural { msg: String },
    /// No handler is registered for this compression code.
    UnsupportedCompression { code: String },
    /// The registry fallback was reached while strict mode was requested.
    UnknownTre { tag: String },
    /// A TRE does not fit any description registered for its tag.
    MalformedTre {
        tag: String,
        length: usize,
        offset: usize,
    },
    /// A plug-in could not be loaded or registered.
    PluginLoad { msg: String },
    /// A sub-window, band list or other argument is out of range.
    InvalidArgument { msg: String },
    /// Enum creation error.
    ParseEnum { f: String, code: String },
    /// Carries the location of a failure up to the nearest record operation.
    At {
        segment: SegmentKind,
        field: String,
        offset: u64,
        source: Box<NitfError>,
    },
}

impl NitfError {
    /// Wrap an error with the segment kind, field name and file offset at
    /// which it was detected.
    pub fn at(self, segment: SegmentKind, field: &str, offset: u64) -> Self {
        NitfError::At {
            segment,
            field: field.to_string(),
            offset,
            source: Box::new(self),
        }
    }

    /// Strip location wrappers and return the underlying error.
    pub fn root(&self) -> &NitfError {
        match self {
            NitfError::At { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<std::array::TryFromSliceError> for NitfError {
    fn from(e: std::array::TryFromSliceError) -> Self {
        Self::TryFromSlice(e)
    }
}

impl From<std::string::FromUtf8Error> for NitfError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::TryFromUtf8(e)
    }
}

impl From<std::io::Error> for NitfError {
    fn from(e: std::io::Error) -> Self {
        Self::StdIoError(e)
    }
}

impl std::fmt::Display for NitfError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use self::NitfError::*;
        match self {
            TryFromSlice(x) => write!(fmt, "{}", x),
            TryFromUtf8(x) => write!(fmt, "{}", x),
            StdIoError(x) => write!(fmt, "{}", x),
            NotNitf { magic } => write!(fmt, "File does not start with a NITF or NSIF version string (found {:?})", magic),
            WrongClass { field, class } => write!(fmt, "Content of field {} violates character class {}", field, class),
            Truncation { field, width, needed } => write!(fmt, "Value needs {} bytes but field {} is {} bytes wide", needed, field, width),
            Parse { field, value } => write!(fmt, "Could not parse {:?} in field {}", value, field),
            Eof => write!(fmt, "Unexpected end of data"),
            NotSeekable => write!(fmt, "The I/O interface does not support seeking"),
            Structural { msg } => write!(fmt, "Structural error: {}", msg),
            UnsupportedCompression { code } => write!(fmt, "No handler registered for compression code {}", code),
            UnknownTre { tag } => write!(fmt, "No description registered for TRE {}", tag),
            MalformedTre { tag, length, offset } => write!(fmt, "TRE {} ({} bytes) does not fit any registered description; first failure at byte {}", tag, length, offset),
            PluginLoad { msg } => write!(fmt, "Plug-in load failed: {}", msg),
            InvalidArgument { msg } => write!(fmt, "Invalid argument: {}", msg),
            ParseEnum { f, code } => write!(fmt, "Could not parse source ({}) to {}.", code, f),
            At { segment, field, offset, source } => write!(fmt, "{} (in {} field {} at file offset {})", source, segment, field, offset),
        }
    }
}

impl From<NitfError> for String {
    fn from(e: NitfError) -> String {
        e.to_string()
    }
}

impl std::error::Error for NitfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use self::NitfError::*;
        match self {
            TryFromSlice(x) => x.source(),
            TryFromUtf8(x) => x.source(),
            StdIoError(x) => x.source(),
            At { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
