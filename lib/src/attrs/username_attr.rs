use crate::attrs::RawAttr;
use crate::constants::ATTR_USERNAME;
use crate::error::ParsePacketErr;
use bytes::Bytes;

// rfc 3489, 11.2.6
// 内容不透明, 不要求utf8

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsernameAttr {
    pub value: Bytes,
}

impl UsernameAttr {
    pub fn new(value: Bytes) -> Self {
        Self { value }
    }
}

impl From<UsernameAttr> for RawAttr {
    fn from(attr: UsernameAttr) -> Self {
        RawAttr::new(ATTR_USERNAME, attr.value)
    }
}

impl TryFrom<RawAttr> for UsernameAttr {
    type Error = ParsePacketErr;

    fn try_from(base_attr: RawAttr) -> Result<Self, Self::Error> {
        Ok(Self {
            value: base_attr.value,
        })
    }
}
