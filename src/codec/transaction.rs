//! Transactions: batched add/update/delete changes for one file version.
//!
//! Layout: filename (string field), version (`u32`), item count (`u32`), then
//! that many `{u32 item length}{item bytes}` sub-frames. Each sub-frame starts
//! with its own kind tag:
//!
//! - `Delete`: a plain `i32` id array.
//! - `Add` / `Update`: an object list (see [`super::object`]).
//!
//! Other nested kinds are skipped using their declared length.

use super::{
    DecodeError,
    EncodeError,
    NameOptions,
    SceneObject,
    WireReader,
    WireWriter,
    object::{encode_object_list, read_object_list},
};
use crate::message::MessageKind;

/// A batch of changes for one filename and version.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transaction {
    /// File the changes apply to.
    pub filename: String,
    /// File version after the changes.
    pub version: u32,
    /// Ids removed from the scene.
    pub delete: Vec<i32>,
    /// Objects new to the scene.
    pub add: Vec<SceneObject>,
    /// Objects whose contents changed.
    pub update: Vec<SceneObject>,
}

impl Transaction {
    /// Returns `true` if the batch carries no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.add.is_empty() && self.update.is_empty()
    }

    /// Decode a transaction body at the reader's cursor.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the body or any nested item is truncated
    /// or malformed.
    pub fn decode(reader: &mut WireReader<'_>, options: NameOptions) -> Result<Self, DecodeError> {
        let mut transaction = Self {
            filename: reader.read_string()?,
            version: reader.read_u32()?,
            ..Self::default()
        };
        let items = reader.read_u32()?;
        for _ in 0..items {
            let offset = reader.offset();
            let raw = reader.read_u32()?;
            let len = usize::try_from(raw)
                .map_err(|_| DecodeError::LengthOverflow { offset, count: raw })?;
            let mut item = reader.sub_reader(len)?;
            transaction.decode_item(&mut item, options)?;
        }
        Ok(transaction)
    }

    fn decode_item(&mut self, item: &mut WireReader<'_>, options: NameOptions) -> Result<(), DecodeError> {
        match item.read_kind()? {
            MessageKind::Delete => self.delete.extend(item.read_i32_array()?),
            MessageKind::Add => self.add.extend(read_object_list(item, options)?),
            MessageKind::Update => self.update.extend(read_object_list(item, options)?),
            _ => {}
        }
        Ok(())
    }

    /// Append this transaction body to `writer`.
    ///
    /// Empty change lists are omitted from the item sequence.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if any field or record fails to encode.
    pub fn encode(&self, writer: &mut WireWriter) -> Result<(), EncodeError> {
        let mut items = Vec::with_capacity(3);
        if !self.delete.is_empty() {
            let mut item = WireWriter::new();
            item.put_kind(MessageKind::Delete);
            item.put_i32_array(&self.delete)?;
            items.push(item);
        }
        for (kind, objects) in [(MessageKind::Add, &self.add), (MessageKind::Update, &self.update)] {
            if objects.is_empty() {
                continue;
            }
            let mut item = WireWriter::new();
            item.put_kind(kind);
            encode_object_list(&mut item, objects)?;
            items.push(item);
        }

        writer.put_string(&self.filename)?;
        writer.put_u32(self.version);
        let count = u32::try_from(items.len())
            .map_err(|_| EncodeError::LengthTooLarge { len: items.len() })?;
        writer.put_u32(count);
        items
            .iter()
            .try_for_each(|item| writer.put_length_prefixed(item.as_slice()))
    }
}

/// Decode a transaction body at `offset`.
///
/// # Errors
///
/// See [`Transaction::decode`].
pub fn decode_transaction(
    buf: &[u8],
    offset: usize,
    options: NameOptions,
) -> Result<(Transaction, usize), DecodeError> {
    let mut reader = WireReader::at(buf, offset);
    let transaction = Transaction::decode(&mut reader, options)?;
    Ok((transaction, reader.offset()))
}

/// Append a transaction body.
///
/// # Errors
///
/// See [`Transaction::encode`].
pub fn encode_transaction(writer: &mut WireWriter, transaction: &Transaction) -> Result<(), EncodeError> {
    transaction.encode(writer)
}
