//! dBASE III+ attribute tables (`.dbf`).
//!
//! Field values are kept as the raw fixed-width bytes found on disk. Columns
//! that are not touched are re-emitted exactly as read, whatever their type
//! or text encoding.

use std::borrow::Cow;

use bytes::{Buf, BufMut};

use crate::error::{ShapefileError, ShapefileResult, SourcePosition};

/// Version byte written for new tables (dBASE III without memo).
pub const DBASE_III: u8 = 0x03;
/// Maximum length of a field name in bytes.
pub const MAX_FIELD_NAME_LEN: usize = 10;

const HEADER_LEN: usize = 32;
const DESCRIPTOR_LEN: usize = 32;
const HEADER_TERMINATOR: u8 = 0x0D;
const END_OF_FILE: u8 = 0x1A;
const ACTIVE: u8 = b' ';
const DELETED: u8 = b'*';
const CONTEXT: &str = "attribute table";

/// Column type tag of a field descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Character,
    Numeric,
    Float,
    Date,
    Logical,
    Memo,
    Other(u8),
}

impl FieldType {
    #[must_use]
    pub fn from_byte(tag: u8) -> Self {
        match tag {
            b'C' => FieldType::Character,
            b'N' => FieldType::Numeric,
            b'F' => FieldType::Float,
            b'D' => FieldType::Date,
            b'L' => FieldType::Logical,
            b'M' => FieldType::Memo,
            other => FieldType::Other(other),
        }
    }

    #[must_use]
    pub fn as_byte(self) -> u8 {
        match self {
            FieldType::Character => b'C',
            FieldType::Numeric => b'N',
            FieldType::Float => b'F',
            FieldType::Date => b'D',
            FieldType::Logical => b'L',
            FieldType::Memo => b'M',
            FieldType::Other(tag) => tag,
        }
    }

    /// Returns `true` for `N` and `F` columns.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Numeric | FieldType::Float)
    }

    /// Human readable label, e.g. `"Character"`.
    #[must_use]
    pub fn label(self) -> Cow<'static, str> {
        match self {
            FieldType::Character => Cow::Borrowed("Character"),
            FieldType::Numeric => Cow::Borrowed("Numeric"),
            FieldType::Float => Cow::Borrowed("Float"),
            FieldType::Date => Cow::Borrowed("Date"),
            FieldType::Logical => Cow::Borrowed("Logical"),
            FieldType::Memo => Cow::Borrowed("Memo"),
            FieldType::Other(tag) => Cow::Owned(format!("Other({})", char::from(tag))),
        }
    }
}

/// One column of the attribute table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    raw_name: [u8; 11],
    field_type: FieldType,
    length: u8,
    decimal_count: u8,
    displacement: [u8; 4],
    reserved: [u8; 14],
}

impl FieldDescriptor {
    /// Create a descriptor for a new column.
    ///
    /// # Errors
    ///
    /// Returns a layout error when the name is empty, longer than
    /// [`MAX_FIELD_NAME_LEN`] bytes, not ASCII or contains NUL, or when the
    /// length is zero.
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
        length: u8,
        decimal_count: u8,
    ) -> ShapefileResult<Self> {
        let name = name.into();
        validate_field_name(&name)?;
        if length == 0 {
            return Err(ShapefileError::layout(format!(
                "field '{name}' must be at least one byte wide"
            )));
        }
        if field_type.is_numeric() && decimal_count >= length {
            return Err(ShapefileError::layout(format!(
                "field '{name}' has {decimal_count} decimals but is only {length} wide"
            )));
        }

        let mut raw_name = [0u8; 11];
        raw_name[..name.len()].copy_from_slice(name.as_bytes());

        Ok(Self {
            name,
            raw_name,
            field_type,
            length,
            decimal_count,
            displacement: [0; 4],
            reserved: [0; 14],
        })
    }

    /// Character column of `length` bytes.
    ///
    /// # Errors
    ///
    /// See [`FieldDescriptor::new`].
    pub fn character(name: impl Into<String>, length: u8) -> ShapefileResult<Self> {
        Self::new(name, FieldType::Character, length, 0)
    }

    /// Numeric (`N`) column.
    ///
    /// # Errors
    ///
    /// See [`FieldDescriptor::new`].
    pub fn numeric(name: impl Into<String>, length: u8, decimals: u8) -> ShapefileResult<Self> {
        Self::new(name, FieldType::Numeric, length, decimals)
    }

    /// Floating point (`F`) column.
    ///
    /// # Errors
    ///
    /// See [`FieldDescriptor::new`].
    pub fn float(name: impl Into<String>, length: u8, decimals: u8) -> ShapefileResult<Self> {
        Self::new(name, FieldType::Float, length, decimals)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    #[must_use]
    pub fn length(&self) -> u8 {
        self.length
    }

    #[must_use]
    pub fn decimal_count(&self) -> u8 {
        self.decimal_count
    }

    /// Encode a text value into this field's fixed width.
    ///
    /// Character columns are left-justified, every other type right-justified,
    /// both padded with spaces.
    ///
    /// # Errors
    ///
    /// Returns a layout error when the value is wider than the field.
    pub fn encode_text(&self, text: &str) -> ShapefileResult<Vec<u8>> {
        let width = usize::from(self.length);
        if text.len() > width {
            return Err(ShapefileError::layout(format!(
                "value '{text}' is wider than field '{}' ({width} bytes)",
                self.name
            )));
        }
        let padded = if self.field_type == FieldType::Character {
            format!("{text:<width$}")
        } else {
            format!("{text:>width$}")
        };
        Ok(padded.into_bytes())
    }

    fn decode(raw: &[u8], index: usize, offset: usize) -> ShapefileResult<Self> {
        let mut buf = raw;
        let mut raw_name = [0u8; 11];
        buf.copy_to_slice(&mut raw_name);
        let name_len = raw_name.iter().position(|b| *b == 0).unwrap_or(raw_name.len());
        let name = String::from_utf8_lossy(&raw_name[..name_len]).trim().to_string();
        let field_type = FieldType::from_byte(buf.get_u8());
        let mut displacement = [0u8; 4];
        buf.copy_to_slice(&mut displacement);
        let length = buf.get_u8();
        let decimal_count = buf.get_u8();
        let mut reserved = [0u8; 14];
        buf.copy_to_slice(&mut reserved);

        if length == 0 {
            return Err(ShapefileError::parse(
                format!("field '{name}' has zero length"),
                SourcePosition {
                    byte_offset: Some(offset as u64),
                    record: None,
                    field: Some(index as u64 + 1),
                },
                CONTEXT,
            ));
        }

        Ok(Self {
            name,
            raw_name,
            field_type,
            length,
            decimal_count,
            displacement,
            reserved,
        })
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.put_slice(&self.raw_name);
        out.put_u8(self.field_type.as_byte());
        out.put_slice(&self.displacement);
        out.put_u8(self.length);
        out.put_u8(self.decimal_count);
        out.put_slice(&self.reserved);
    }
}

/// Check that `name` can be stored in a field descriptor.
///
/// # Errors
///
/// Returns a layout error describing the first violated constraint.
pub fn validate_field_name(name: &str) -> ShapefileResult<()> {
    if name.is_empty() {
        return Err(ShapefileError::layout("field name must not be empty"));
    }
    if name.len() > MAX_FIELD_NAME_LEN {
        return Err(ShapefileError::layout(format!(
            "field name '{name}' is longer than {MAX_FIELD_NAME_LEN} bytes"
        )));
    }
    if !name.is_ascii() || name.bytes().any(|b| b == 0 || b.is_ascii_control()) {
        return Err(ShapefileError::layout(format!(
            "field name '{name}' must be printable ASCII"
        )));
    }
    Ok(())
}

/// One row of the attribute table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    flag: u8,
    values: Vec<Vec<u8>>,
}

impl Record {
    /// Returns `true` when the record carries the deletion marker.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.flag == DELETED
    }

    /// Raw fixed-width bytes of the value at `index`.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&[u8]> {
        self.values.get(index).map(Vec::as_slice)
    }

    /// Value at `index` as trimmed text (invalid UTF-8 is replaced).
    #[must_use]
    pub fn text(&self, index: usize) -> Option<String> {
        self.value(index)
            .map(|raw| String::from_utf8_lossy(raw).trim().to_string())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An attribute table: header metadata, schema and records in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    version: u8,
    last_update: [u8; 3],
    header_reserved: [u8; 20],
    header_padding: Vec<u8>,
    fields: Vec<FieldDescriptor>,
    records: Vec<Record>,
}

impl Table {
    /// Create an empty table with the given schema.
    ///
    /// # Errors
    ///
    /// Returns a layout error when two fields share a name.
    pub fn new(fields: Vec<FieldDescriptor>) -> ShapefileResult<Self> {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(ShapefileError::layout(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }
        Ok(Self {
            version: DBASE_III,
            last_update: [0, 1, 1],
            header_reserved: [0; 20],
            header_padding: Vec::new(),
            fields,
            records: Vec::new(),
        })
    }

    /// Decode a `.dbf` payload.
    ///
    /// # Errors
    ///
    /// Returns a parse error when the header, descriptor table or record area
    /// is truncated or inconsistent.
    pub fn read(bytes: &[u8]) -> ShapefileResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(ShapefileError::truncated(
                HEADER_LEN - bytes.len(),
                SourcePosition::at_byte(bytes.len()),
                CONTEXT,
            ));
        }

        let mut header = &bytes[..HEADER_LEN];
        let version = header.get_u8();
        let mut last_update = [0u8; 3];
        header.copy_to_slice(&mut last_update);
        let record_count = header.get_u32_le() as usize;
        let header_length = usize::from(header.get_u16_le());
        let record_length = usize::from(header.get_u16_le());
        let mut header_reserved = [0u8; 20];
        header.copy_to_slice(&mut header_reserved);

        if header_length <= HEADER_LEN || header_length > bytes.len() {
            return Err(ShapefileError::parse(
                format!(
                    "header length {header_length} is outside the {} byte payload",
                    bytes.len()
                ),
                SourcePosition::at_byte(8),
                CONTEXT,
            ));
        }

        let mut fields = Vec::new();
        let mut cursor = HEADER_LEN;
        loop {
            if cursor >= header_length {
                return Err(ShapefileError::parse(
                    "field descriptor terminator not found",
                    SourcePosition::at_byte(cursor),
                    CONTEXT,
                ));
            }
            if bytes[cursor] == HEADER_TERMINATOR {
                break;
            }
            if cursor + DESCRIPTOR_LEN > header_length {
                return Err(ShapefileError::truncated(
                    cursor + DESCRIPTOR_LEN - header_length,
                    SourcePosition::at_byte(cursor),
                    CONTEXT,
                ));
            }
            fields.push(FieldDescriptor::decode(
                &bytes[cursor..cursor + DESCRIPTOR_LEN],
                fields.len(),
                cursor,
            )?);
            cursor += DESCRIPTOR_LEN;
        }
        let header_padding = bytes[cursor + 1..header_length].to_vec();

        let expected = 1 + fields.iter().map(|f| usize::from(f.length)).sum::<usize>();
        if record_length != expected {
            return Err(ShapefileError::parse(
                format!("record length {record_length} does not match field widths ({expected})"),
                SourcePosition::at_byte(10),
                CONTEXT,
            ));
        }

        let body = &bytes[header_length..];
        let needed = record_count.checked_mul(record_length).ok_or_else(|| {
            ShapefileError::parse(
                format!("{record_count} records of {record_length} bytes overflow"),
                SourcePosition::at_byte(4),
                CONTEXT,
            )
        })?;
        if body.len() < needed {
            let complete = body.len() / record_length;
            return Err(ShapefileError::truncated(
                needed - body.len(),
                SourcePosition::at_record(complete + 1, header_length + complete * record_length),
                CONTEXT,
            ));
        }

        let records = body[..needed]
            .chunks_exact(record_length)
            .map(|chunk| {
                let mut values = Vec::with_capacity(fields.len());
                let mut start = 1;
                for field in &fields {
                    let stop = start + usize::from(field.length);
                    values.push(chunk[start..stop].to_vec());
                    start = stop;
                }
                Record {
                    flag: chunk[0],
                    values,
                }
            })
            .collect();

        Ok(Self {
            version,
            last_update,
            header_reserved,
            header_padding,
            fields,
            records,
        })
    }

    /// Encode the table, recomputing counts and lengths from its contents.
    ///
    /// # Errors
    ///
    /// Returns a layout error when the header or records exceed the 16-bit
    /// lengths or the 32-bit record count of the format.
    pub fn to_bytes(&self) -> ShapefileResult<Vec<u8>> {
        let header_length =
            HEADER_LEN + self.fields.len() * DESCRIPTOR_LEN + 1 + self.header_padding.len();
        let header_length = u16::try_from(header_length).map_err(|_| {
            ShapefileError::layout(format!("{} fields exceed the header size", self.fields.len()))
        })?;
        let record_length = u16::try_from(self.record_length()).map_err(|_| {
            ShapefileError::layout(format!(
                "record length {} exceeds 65535 bytes",
                self.record_length()
            ))
        })?;
        let record_count = u32::try_from(self.records.len()).map_err(|_| {
            ShapefileError::layout(format!("{} records exceed the format", self.records.len()))
        })?;

        let mut out = Vec::with_capacity(
            usize::from(header_length) + self.records.len() * usize::from(record_length) + 1,
        );
        out.put_u8(self.version);
        out.put_slice(&self.last_update);
        out.put_u32_le(record_count);
        out.put_u16_le(header_length);
        out.put_u16_le(record_length);
        out.put_slice(&self.header_reserved);
        for field in &self.fields {
            field.encode(&mut out);
        }
        out.put_u8(HEADER_TERMINATOR);
        out.put_slice(&self.header_padding);

        for record in &self.records {
            out.put_u8(record.flag);
            for value in &record.values {
                out.put_slice(value);
            }
        }
        out.put_u8(END_OF_FILE);
        Ok(out)
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Bytes per record including the deletion flag.
    #[must_use]
    pub fn record_length(&self) -> usize {
        1 + self
            .fields
            .iter()
            .map(|f| usize::from(f.length))
            .sum::<usize>()
    }

    /// Index of the field named exactly `name` (case-sensitive).
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Append an active record from text values, one per field.
    ///
    /// # Errors
    ///
    /// Returns a layout error on a value count mismatch or when a value is
    /// wider than its field.
    pub fn push_row(&mut self, row: &[&str]) -> ShapefileResult<()> {
        if row.len() != self.fields.len() {
            return Err(ShapefileError::layout(format!(
                "row has {} values for {} fields",
                row.len(),
                self.fields.len()
            )));
        }
        let values = self
            .fields
            .iter()
            .zip(row)
            .map(|(field, text)| field.encode_text(text))
            .collect::<ShapefileResult<Vec<_>>>()?;
        self.records.push(Record {
            flag: ACTIVE,
            values,
        });
        Ok(())
    }

    /// Replace the column at `index` with a new descriptor and one encoded
    /// value per record. The column keeps its position.
    ///
    /// # Errors
    ///
    /// Returns a layout error when `index` is out of range, the new name
    /// collides with another column, or the values do not match the
    /// descriptor width and record count.
    pub fn replace_field(
        &mut self,
        index: usize,
        descriptor: FieldDescriptor,
        values: Vec<Vec<u8>>,
    ) -> ShapefileResult<()> {
        if index >= self.fields.len() {
            return Err(ShapefileError::layout(format!(
                "field index {index} is out of range for {} fields",
                self.fields.len()
            )));
        }
        if self
            .fields
            .iter()
            .enumerate()
            .any(|(i, f)| i != index && f.name == descriptor.name)
        {
            return Err(ShapefileError::layout(format!(
                "duplicate field name '{}'",
                descriptor.name
            )));
        }
        self.check_column(&descriptor, &values)?;

        self.fields[index] = descriptor;
        for (record, value) in self.records.iter_mut().zip(values) {
            record.values[index] = value;
        }
        Ok(())
    }

    /// Append a column with one encoded value per record.
    ///
    /// # Errors
    ///
    /// Returns a layout error when the name already exists or the values do
    /// not match the descriptor width and record count.
    pub fn push_field(
        &mut self,
        descriptor: FieldDescriptor,
        values: Vec<Vec<u8>>,
    ) -> ShapefileResult<()> {
        if self.field_index(&descriptor.name).is_some() {
            return Err(ShapefileError::layout(format!(
                "duplicate field name '{}'",
                descriptor.name
            )));
        }
        self.check_column(&descriptor, &values)?;

        self.fields.push(descriptor);
        for (record, value) in self.records.iter_mut().zip(values) {
            record.values.push(value);
        }
        Ok(())
    }

    fn check_column(
        &self,
        descriptor: &FieldDescriptor,
        values: &[Vec<u8>],
    ) -> ShapefileResult<()> {
        if values.len() != self.records.len() {
            return Err(ShapefileError::layout(format!(
                "column '{}' has {} values for {} records",
                descriptor.name,
                values.len(),
                self.records.len()
            )));
        }
        let width = usize::from(descriptor.length);
        if let Some(pos) = values.iter().position(|v| v.len() != width) {
            return Err(ShapefileError::layout(format!(
                "value {} of column '{}' is {} bytes, expected {width}",
                pos + 1,
                descriptor.name,
                values[pos].len()
            )));
        }
        Ok(())
    }
}
