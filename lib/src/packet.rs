use crate::attrs;
use crate::attrs::address_attr::AddressAttr;
use crate::attrs::change_request::ChangeRequest;
use crate::attrs::errcode_attr::ErrcodeAttr;
use crate::attrs::unknown_attrs::UnknownAttrs;
use crate::attrs::RawAttr;
use crate::constants::*;
use crate::error::{AttrValidator, ParsePacketErr, ValidateErr};
use crate::header::{Header, MessageClass};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt::Debug;

// 是否是一个正确的stun 包
// message_type 在范围内
// 验证message length, 属性按4字节对齐推进
// 属性解析是否正常
// 未识别的属性按原始字节保留

#[derive(Debug, Clone)]
pub struct Packet {
    pub header: Header,
    pub attrs: Vec<RawAttr>,
}

impl Packet {
    pub fn new(header: Header, attrs: Vec<RawAttr>) -> Self {
        let mut packet = Self { header, attrs };
        packet.update_header_len();
        packet
    }

    fn update_header_len(&mut self) {
        let total = self.attrs.iter().fold(0_usize, |acc, x| acc + x.len());
        self.header.msg_len = total as u16;
    }

    pub fn class(&self) -> MessageClass {
        self.header.class()
    }

    pub fn method(&self) -> u16 {
        self.header.method()
    }

    pub fn add_attr(&mut self, attr: RawAttr) {
        self.attrs.push(attr);
        self.update_header_len();
    }

    pub fn add_attrs(&mut self, mut attrs: Vec<RawAttr>) {
        self.attrs.append(&mut attrs);
        self.update_header_len();
    }

    // 同类型出现多次时只取第一个
    pub fn find_attr(&self, attr_type: u16) -> Option<&RawAttr> {
        self.attrs.iter().find(|v| v.attr_type == attr_type)
    }

    pub fn find_address_attr(&self, attr_type: u16) -> Option<AddressAttr> {
        let attr = self.find_attr(attr_type)?;
        attr.clone().try_into().ok()
    }

    pub fn is_recognized(attr_type: u16) -> bool {
        matches!(
            attr_type,
            ATTR_MAPPED_ADDRESS
                | ATTR_RESPONSE_ADDRESS
                | ATTR_CHANGE_REQUEST
                | ATTR_SOURCE_ADDRESS
                | ATTR_CHANGED_ADDRESS
                | ATTR_USERNAME
                | ATTR_ERROR_CODE
                | ATTR_UNKNOWN_ATTRIBUTES
                | ATTR_REFLECTED_FROM
        )
    }

    // 0x8000以下未识别的类型要上报给调用方, 以上直接忽略
    pub fn unknown_mandatory_attrs(&self) -> Vec<u16> {
        self.attrs
            .iter()
            .filter(|v| v.attr_type < ATTR_OPTIONAL_START && !Self::is_recognized(v.attr_type))
            .map(|v| v.attr_type)
            .collect()
    }

    pub fn pack(&self) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_slice(&self.header.pack());
        for v in self.attrs.iter() {
            buf.put_slice(&v.pack());
        }

        buf.freeze()
    }

    pub fn unpack(mut buf_bytes: Bytes) -> Result<Self, ParsePacketErr> {
        if buf_bytes.len() < HEADER_LEN {
            return Err(ParsePacketErr::BufSize(format!(
                "header buf len:{} < {}",
                buf_bytes.len(),
                HEADER_LEN
            )));
        }

        let header_buf = buf_bytes.split_to(HEADER_LEN);
        let header = Header::unpack(header_buf)?;
        let origin_header_len = header.msg_len;

        if header.msg_len as usize != buf_bytes.len() {
            return Err(ParsePacketErr::NotMatch(format!(
                "header len:{} != {}",
                header.msg_len,
                buf_bytes.len()
            )));
        }

        let mut attr_list = vec![];

        let mut max_attr = MAX_ATTR_COUNT;

        while buf_bytes.len() >= 4 {
            if max_attr == 0 {
                return Err(ParsePacketErr::TooManyAttrs);
            }

            let attr_len = u16::from_be_bytes([buf_bytes[2], buf_bytes[3]]) as usize;

            // 按padding后的长度切块推进
            let padded_len = attr_len + 4 + crate::util::pad_len(attr_len);

            if buf_bytes.len() < padded_len {
                return Err(ParsePacketErr::BufSize(format!(
                    "attr buf len:{} < {}",
                    buf_bytes.len(),
                    padded_len
                )));
            }
            let attr_buf = buf_bytes.split_to(padded_len);
            let attr = RawAttr::unpack(attr_buf)?;
            attr_list.push(attr);

            max_attr -= 1;
        }

        if !buf_bytes.is_empty() {
            return Err(ParsePacketErr::NotMatch(format!(
                "trailing bytes:{}",
                buf_bytes.len()
            )));
        }

        let packet = Packet::new(header, attr_list);
        if packet.header.msg_len != origin_header_len {
            return Err(ParsePacketErr::NotMatch(format!(
                "packet data len:{} != packet msg len:{}",
                packet.header.msg_len, origin_header_len
            )));
        }

        Ok(packet)
    }

    pub fn validate(&self) -> Option<ValidateErr> {
        if let Some(v) = self.header.validate() {
            return Some(v);
        }

        for v in self.attrs.iter() {
            if AddressAttr::is_address_attr(v.attr_type) {
                if let Some(e) = validate_attr::<AddressAttr>(v) {
                    return Some(e);
                }
            }
            if v.attr_type == ATTR_ERROR_CODE {
                if let Some(e) = validate_attr::<ErrcodeAttr>(v) {
                    return Some(e);
                }
            }
            if v.attr_type == ATTR_CHANGE_REQUEST {
                let attr: Result<ChangeRequest, _> = v.clone().try_into();
                if let Err(e) = attr {
                    return Some(ValidateErr(format!("{:?}", e)));
                }
            }
            if v.attr_type == ATTR_UNKNOWN_ATTRIBUTES {
                let attr: Result<UnknownAttrs, _> = v.clone().try_into();
                if let Err(e) = attr {
                    return Some(ValidateErr(format!("{:?}", e)));
                }
            }
        }

        None
    }
}

fn validate_attr<T>(raw_attr: &RawAttr) -> Option<ValidateErr>
where
    T: AttrValidator + TryFrom<RawAttr>,
    <T as std::convert::TryFrom<attrs::RawAttr>>::Error: Debug,
{
    let attr: Result<T, _> = raw_attr.clone().try_into();
    match attr {
        Ok(v) => v.validate(),
        Err(e) => Some(ValidateErr(format!("{:?}", e))),
    }
}
