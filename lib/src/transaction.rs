use crate::constants::TRANS_ID_LEN;
use crate::error::StunError;
use crate::header::TransId;
use crate::util;
use rand::prelude::*;
use std::collections::HashSet;
use std::sync::Mutex;

// 在途transaction id集合, 按hex字符串记账
// 分配时查重, 撞了就重新生成
// 收到响应/超时/调用方放弃时释放

#[derive(Debug, Default)]
pub struct TransactionAllocator {
    outstanding: Mutex<HashSet<String>>,
}

impl TransactionAllocator {
    pub fn new() -> Self {
        Self {
            outstanding: Mutex::new(HashSet::new()),
        }
    }

    pub fn allocate(&self) -> TransId {
        let mut trans_id = [0u8; TRANS_ID_LEN];
        let mut set = self.outstanding.lock().unwrap();

        loop {
            rand::thread_rng().fill_bytes(&mut trans_id);
            let key = util::hex_key(&trans_id);
            if set.insert(key) {
                break;
            }
        }

        trans_id
    }

    // 默认16字节, 也允许指定长度
    pub fn allocate_len(&self, len: usize) -> Result<Vec<u8>, StunError> {
        if len == 0 {
            return Err(StunError::InvalidArgument(format!(
                "trans id len:{}",
                len
            )));
        }

        let mut trans_id = vec![0u8; len];
        let mut set = self.outstanding.lock().unwrap();

        loop {
            rand::thread_rng().fill_bytes(&mut trans_id);
            let key = util::hex_key(&trans_id);
            if set.insert(key) {
                break;
            }
        }

        Ok(trans_id)
    }

    pub fn release(&self, trans_id: &[u8]) -> bool {
        let key = util::hex_key(trans_id);
        self.outstanding.lock().unwrap().remove(&key)
    }

    pub fn is_outstanding(&self, trans_id: &[u8]) -> bool {
        let key = util::hex_key(trans_id);
        self.outstanding.lock().unwrap().contains(&key)
    }

    pub fn outstanding_count(&self) -> usize {
        self.outstanding.lock().unwrap().len()
    }
}
