use crate::attrs::RawAttr;
use crate::constants::ATTR_UNKNOWN_ATTRIBUTES;
use crate::error::ParsePacketErr;
use bytes::{BufMut, BytesMut};
use std::ops::Deref;

// rfc 3489, 11.2.10
// 类型码列表, 奇数个时重复最后一个凑齐4字节边界

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAttrs {
    pub types: Vec<u16>,
}

impl UnknownAttrs {
    pub fn new(types: Vec<u16>) -> Self {
        Self { types }
    }
}

impl From<UnknownAttrs> for RawAttr {
    fn from(attr: UnknownAttrs) -> Self {
        let mut list = attr.types;
        if list.len() % 2 == 1 {
            if let Some(last) = list.last().copied() {
                list.push(last);
            }
        }

        let mut bytes_buf = BytesMut::with_capacity(list.len() * 2);
        for v in list.iter() {
            bytes_buf.put_u16(*v);
        }

        let value = bytes_buf.freeze();
        RawAttr::new(ATTR_UNKNOWN_ATTRIBUTES, value)
    }
}

impl TryFrom<RawAttr> for UnknownAttrs {
    type Error = ParsePacketErr;

    fn try_from(base_attr: RawAttr) -> Result<Self, Self::Error> {
        if base_attr.value.len() % 4 != 0 {
            return Err(ParsePacketErr::BadValue(format!(
                "unknown_attributes attr len:{}",
                base_attr.value.len()
            )));
        }

        let value = base_attr.value.deref();
        let mut types = Vec::with_capacity(value.len() / 2);

        let mut index = 0_usize;
        while index + 2 <= value.len() {
            types.push(u16::from_be_bytes([value[index], value[index + 1]]));
            index += 2;
        }

        Ok(Self { types })
    }
}
