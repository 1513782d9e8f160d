use link::LinkError;
use std::{error::Error, fmt::Display};

#[derive(Debug)]
pub enum CombineError {
    /// 哈希位宽必须是8的正整数倍
    HashWidth(usize),

    /// The released public table cannot cover the hash width.
    TableTooShort { rows: usize, width: usize },

    /// The exchange with the key-table service failed.
    Link(LinkError),
}

impl Display for CombineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CombineError::HashWidth(bits) => f.write_fmt(format_args!(
                "hash width `{bits}` is not a positive multiple of 8"
            )),
            CombineError::TableTooShort { rows, width } => f.write_fmt(format_args!(
                "public table of {rows} rows cannot cover a hash of {width} bits"
            )),
            CombineError::Link(e) => Display::fmt(e, f),
        }
    }
}

impl Error for CombineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CombineError::Link(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LinkError> for CombineError {
    fn from(value: LinkError) -> Self {
        CombineError::Link(value)
    }
}
