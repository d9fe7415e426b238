pub const TRANS_ID_LEN: usize = 16;
pub const HEADER_LEN: usize = 20;

// rfc 3489, 11.1
// message type = method | class bits
pub const METHOD_BINDING: u16 = 0x0001;
pub const METHOD_SHARED_SECRET: u16 = 0x0002;

pub const CLASS_BITS_REQUEST: u16 = 0x0000;
pub const CLASS_BITS_INDICATION: u16 = 0x0010;
pub const CLASS_BITS_SUCCESS: u16 = 0x0100;
pub const CLASS_BITS_ERROR: u16 = 0x0110;
pub const CLASS_MASK: u16 = 0x0110;

pub const MESSAGE_TYPE_BIND_REQ: u16 = 0x0001;
pub const MESSAGE_TYPE_BIND_RES: u16 = 0x0101;
pub const MESSAGE_TYPE_BIND_ERR_RES: u16 = 0x0111;
pub const MESSAGE_TYPE_SECRET_REQ: u16 = 0x0002;
pub const MESSAGE_TYPE_SECRET_RES: u16 = 0x0102;
pub const MESSAGE_TYPE_SECRET_ERR_RES: u16 = 0x0112;

pub const ATTR_FAMILY_IPV4: u8 = 0x01;
pub const ATTR_FAMILY_IPV6: u8 = 0x02;

// rfc 3489, 11.2
pub const ATTR_MAPPED_ADDRESS: u16 = 0x0001;
pub const ATTR_RESPONSE_ADDRESS: u16 = 0x0002;
pub const ATTR_CHANGE_REQUEST: u16 = 0x0003;
pub const ATTR_SOURCE_ADDRESS: u16 = 0x0004;
pub const ATTR_CHANGED_ADDRESS: u16 = 0x0005;
pub const ATTR_USERNAME: u16 = 0x0006;
pub const ATTR_PASSWORD: u16 = 0x0007;
pub const ATTR_MESSAGE_INTEGRITY: u16 = 0x0008;
pub const ATTR_ERROR_CODE: u16 = 0x0009;
pub const ATTR_UNKNOWN_ATTRIBUTES: u16 = 0x000a;
pub const ATTR_REFLECTED_FROM: u16 = 0x000b;

// 0x8000以下必须识别, 以上可忽略
pub const ATTR_OPTIONAL_START: u16 = 0x8000;

// rfc 3489, 11.2.9
pub const ERROR_CODE_BAD_REQUEST: u16 = 400;
pub const ERROR_CODE_UNAUTHORIZED: u16 = 401;
pub const ERROR_CODE_UNKNOWN_ATTRIBUTE: u16 = 420;
pub const ERROR_CODE_STALE_CREDENTIALS: u16 = 430;
pub const ERROR_CODE_INTEGRITY_CHECK_FAILURE: u16 = 431;
pub const ERROR_CODE_MISSING_USERNAME: u16 = 432;
pub const ERROR_CODE_USE_TLS: u16 = 433;
pub const ERROR_CODE_SERVER_ERROR: u16 = 500;
pub const ERROR_CODE_GLOBAL_FAILURE: u16 = 600;

pub const DEFAULT_PORT: u16 = 3478;
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;
pub const MAX_ATTR_COUNT: usize = 32;
