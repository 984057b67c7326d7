//! Binary state encoding
//!
//! Fixed-width integers in native byte order, no header. Streams written on
//! one host are only readable on hosts with the same numeric layout.

use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};
use std::io::{Read, Write};

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_native_endian()
}

/// Write one fixed-width item
pub(crate) fn write<W, T>(writer: &mut W, item: &T) -> bincode::Result<()>
where
    W: Write,
    T: Serialize + ?Sized,
{
    options().serialize_into(writer, item)
}

/// Read one fixed-width item
pub(crate) fn read<R: Read, T: DeserializeOwned>(reader: &mut R) -> bincode::Result<T> {
    options().deserialize_from(reader)
}
