//! IPP binary encoding (RFC 8010).

use super::{Group, IppAttribute, IppAttributes, IppValue};
use crate::error::{PpdCacheError, Result};

// Delimiter tags
const TAG_OPERATION: u8 = 0x01;
const TAG_JOB: u8 = 0x02;
const TAG_END: u8 = 0x03;
const TAG_PRINTER: u8 = 0x04;

// Value tags
const TAG_INTEGER: u8 = 0x21;
const TAG_BOOLEAN: u8 = 0x22;
const TAG_ENUM: u8 = 0x23;
const TAG_STRING: u8 = 0x30;
const TAG_RANGE: u8 = 0x33;
const TAG_BEGIN_COLLECTION: u8 = 0x34;
const TAG_END_COLLECTION: u8 = 0x37;
const TAG_TEXT: u8 = 0x41;
const TAG_NAME: u8 = 0x42;
const TAG_KEYWORD: u8 = 0x44;
const TAG_URI: u8 = 0x45;
const TAG_CHARSET: u8 = 0x47;
const TAG_LANGUAGE: u8 = 0x48;
const TAG_MIMETYPE: u8 = 0x49;
const TAG_MEMBER_NAME: u8 = 0x4a;

/// Encode a message: header, grouped attributes, end tag.
pub fn encode(message: &IppAttributes) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(256);
    out.push(message.version.0);
    out.push(message.version.1);
    out.extend_from_slice(&message.op_or_status.to_be_bytes());
    out.extend_from_slice(&message.request_id.to_be_bytes());

    let mut current: Option<Group> = None;
    for attr in message.iter() {
        if current != Some(attr.group) {
            let tag = match attr.group {
                Group::Operation => TAG_OPERATION,
                Group::Job => TAG_JOB,
                Group::Printer => TAG_PRINTER,
                Group::Zero => {
                    return Err(PpdCacheError::Ipp(format!(
                        "attribute {} has no group",
                        attr.name
                    )));
                }
            };
            out.push(tag);
            current = Some(attr.group);
        }
        write_attribute(&mut out, attr)?;
    }

    out.push(TAG_END);
    Ok(out)
}

fn write_attribute(out: &mut Vec<u8>, attr: &IppAttribute) -> Result<()> {
    if attr.values.is_empty() {
        return Err(PpdCacheError::Ipp(format!("attribute {} has no values", attr.name)));
    }
    for (i, value) in attr.values.iter().enumerate() {
        let name = if i == 0 { attr.name.as_str() } else { "" };
        write_value(out, name, value)?;
    }
    Ok(())
}

fn write_value(out: &mut Vec<u8>, name: &str, value: &IppValue) -> Result<()> {
    match value {
        IppValue::Integer(n) => put(out, TAG_INTEGER, name, &n.to_be_bytes()),
        IppValue::Enum(n) => put(out, TAG_ENUM, name, &n.to_be_bytes()),
        IppValue::Boolean(b) => put(out, TAG_BOOLEAN, name, &[u8::from(*b)]),
        IppValue::Range { lower, upper } => {
            let mut bytes = [0u8; 8];
            bytes[..4].copy_from_slice(&lower.to_be_bytes());
            bytes[4..].copy_from_slice(&upper.to_be_bytes());
            put(out, TAG_RANGE, name, &bytes)
        }
        IppValue::OctetString(bytes) => put(out, TAG_STRING, name, bytes),
        IppValue::Keyword(s) => put(out, TAG_KEYWORD, name, s.as_bytes()),
        IppValue::Name(s) => put(out, TAG_NAME, name, s.as_bytes()),
        IppValue::Text(s) => put(out, TAG_TEXT, name, s.as_bytes()),
        IppValue::Uri(s) => put(out, TAG_URI, name, s.as_bytes()),
        IppValue::MimeMediaType(s) => put(out, TAG_MIMETYPE, name, s.as_bytes()),
        IppValue::Charset(s) => put(out, TAG_CHARSET, name, s.as_bytes()),
        IppValue::NaturalLanguage(s) => put(out, TAG_LANGUAGE, name, s.as_bytes()),
        IppValue::Collection(members) => {
            put(out, TAG_BEGIN_COLLECTION, name, &[])?;
            for member in members.iter() {
                put(out, TAG_MEMBER_NAME, "", member.name.as_bytes())?;
                write_attribute(out, &IppAttribute {
                    group: Group::Zero,
                    name: String::new(),
                    values: member.values.clone(),
                })?;
            }
            put(out, TAG_END_COLLECTION, "", &[])
        }
    }
}

fn put(out: &mut Vec<u8>, tag: u8, name: &str, value: &[u8]) -> Result<()> {
    let name_len = u16::try_from(name.len())
        .map_err(|_| PpdCacheError::Ipp(format!("attribute name too long: {}", name.len())))?;
    let value_len = u16::try_from(value.len())
        .map_err(|_| PpdCacheError::Ipp(format!("value of {name} too long: {}", value.len())))?;

    out.push(tag);
    out.extend_from_slice(&name_len.to_be_bytes());
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(&value_len.to_be_bytes());
    out.extend_from_slice(value);
    Ok(())
}

/// Decode a message from the start of `data`.
///
/// Returns the message and the number of bytes consumed, up to and
/// including the end tag. Trailing bytes are left for the caller.
pub fn decode(data: &[u8]) -> Result<(IppAttributes, usize)> {
    let mut r = Reader { data, pos: 0 };

    let mut message = IppAttributes::new();
    message.version = (r.u8()?, r.u8()?);
    message.op_or_status = r.u16()?;
    message.request_id = r.u32()?;

    let mut group: Option<Group> = None;
    loop {
        let tag = r.u8()?;
        match tag {
            TAG_END => break,
            TAG_OPERATION => group = Some(Group::Operation),
            TAG_JOB => group = Some(Group::Job),
            TAG_PRINTER => group = Some(Group::Printer),
            0x00..=0x0f => return Err(r.error(format!("unsupported group tag 0x{tag:02x}"))),
            _ => {
                let Some(group) = group else {
                    return Err(r.error("value before any group tag"));
                };
                let name = r.string()?;
                let value = read_value(&mut r, tag)?;
                push_value(&mut message, group, name, value, &r)?;
            }
        }
    }

    Ok((message, r.pos))
}

fn push_value(target: &mut IppAttributes, group: Group, name: String, value: IppValue, r: &Reader<'_>) -> Result<()> {
    if name.is_empty() {
        match target.attrs.last_mut() {
            Some(last) => last.values.push(value),
            None => return Err(r.error("additional value without attribute")),
        }
    } else {
        target.add(group, name, value);
    }
    Ok(())
}

fn read_value(r: &mut Reader<'_>, tag: u8) -> Result<IppValue> {
    if tag == TAG_BEGIN_COLLECTION {
        r.bytes()?;
        return read_collection(r);
    }

    let bytes = r.bytes()?;
    let text = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();
    let int = |bytes: &[u8]| -> Result<i32> {
        let arr: [u8; 4] = bytes
            .try_into()
            .map_err(|_| r.error(format!("integer value of length {}", bytes.len())))?;
        Ok(i32::from_be_bytes(arr))
    };

    Ok(match tag {
        TAG_INTEGER => IppValue::Integer(int(bytes)?),
        TAG_ENUM => IppValue::Enum(int(bytes)?),
        TAG_BOOLEAN => IppValue::Boolean(bytes.first().is_some_and(|b| *b != 0)),
        TAG_RANGE if bytes.len() == 8 => IppValue::Range {
            lower: int(&bytes[..4])?,
            upper: int(&bytes[4..])?,
        },
        TAG_STRING => IppValue::OctetString(bytes.to_vec()),
        TAG_KEYWORD => IppValue::Keyword(text(bytes)),
        TAG_NAME => IppValue::Name(text(bytes)),
        TAG_TEXT => IppValue::Text(text(bytes)),
        TAG_URI => IppValue::Uri(text(bytes)),
        TAG_MIMETYPE => IppValue::MimeMediaType(text(bytes)),
        TAG_CHARSET => IppValue::Charset(text(bytes)),
        TAG_LANGUAGE => IppValue::NaturalLanguage(text(bytes)),
        _ => return Err(r.error(format!("unsupported value tag 0x{tag:02x}"))),
    })
}

fn read_collection(r: &mut Reader<'_>) -> Result<IppValue> {
    let mut members = IppAttributes::new();
    let mut member_name: Option<String> = None;

    loop {
        let tag = r.u8()?;
        let _ = r.string()?;
        match tag {
            TAG_END_COLLECTION => {
                r.bytes()?;
                break;
            }
            TAG_MEMBER_NAME => member_name = Some(text_of(r.bytes()?)),
            _ => {
                let value = read_value(r, tag)?;
                match member_name.take() {
                    Some(name) => {
                        members.add_member(name, value);
                    }
                    None => push_value(&mut members, Group::Zero, String::new(), value, r)?,
                }
            }
        }
    }

    Ok(IppValue::Collection(members))
}

fn text_of(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn error(&self, reason: impl std::fmt::Display) -> PpdCacheError {
        PpdCacheError::Ipp(format!("{reason} at offset {}", self.pos))
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.data.len());
        match end {
            Some(end) => {
                let slice = &self.data[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(self.error("truncated data")),
        }
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.u16()?;
        self.take(usize::from(len))
    }

    fn string(&mut self) -> Result<String> {
        Ok(text_of(self.bytes()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printer_attributes() -> IppAttributes {
        let mut size = IppAttributes::new();
        size.add_member("x-dimension", IppValue::Integer(21590))
            .add_member("y-dimension", IppValue::Integer(27940));
        let mut col = IppAttributes::new();
        col.add_member("media-size", IppValue::Collection(size))
            .add_member("media-source", IppValue::Keyword("main".into()));

        let mut attrs = IppAttributes::new();
        attrs
            .add(Group::Operation, "attributes-charset", IppValue::Charset("utf-8".into()))
            .add(Group::Printer, "copies-default", IppValue::Integer(1))
            .add_values(
                Group::Printer,
                "finishings-supported",
                vec![IppValue::Enum(3), IppValue::Enum(4), IppValue::Enum(20)],
            )
            .add(Group::Printer, "page-ranges-supported", IppValue::Boolean(true))
            .add(Group::Printer, "copies-supported", IppValue::Range { lower: 1, upper: 99 })
            .add(Group::Printer, "media-col-default", IppValue::Collection(col));
        attrs
    }

    #[test]
    fn encoded_header_layout() {
        let bytes = encode(&printer_attributes()).unwrap();
        assert_eq!(&bytes[..8], &[2, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(bytes[8], TAG_OPERATION);
        assert_eq!(*bytes.last().unwrap(), TAG_END);
    }

    #[test]
    fn decode_reports_consumed_length() {
        let attrs = printer_attributes();
        let mut bytes = encode(&attrs).unwrap();
        let len = bytes.len();
        bytes.extend_from_slice(b"Trailing 1\n");

        let (decoded, consumed) = decode(&bytes).unwrap();
        assert_eq!(consumed, len);
        assert_eq!(decoded, attrs);
    }

    #[test]
    fn truncated_input_is_an_error() {
        let bytes = encode(&printer_attributes()).unwrap();
        let err = decode(&bytes[..bytes.len() - 5]).unwrap_err();
        assert!(matches!(err, PpdCacheError::Ipp(_)));
    }

    #[test]
    fn member_without_group_cannot_be_encoded() {
        let mut attrs = IppAttributes::new();
        attrs.add_member("x-dimension", IppValue::Integer(1));
        assert!(encode(&attrs).is_err());
    }
}
