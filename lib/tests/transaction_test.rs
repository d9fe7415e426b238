use std::collections::HashSet;

use stun3489::constants::TRANS_ID_LEN;
use stun3489::error::StunError;
use stun3489::transaction::TransactionAllocator;
use stun3489::util;

#[test]
pub fn test_allocate_len_and_uniqueness() {
    let allocator = TransactionAllocator::new();

    let mut keys = HashSet::new();
    for _ in 0..100 {
        let trans_id = allocator.allocate();
        assert_eq!(trans_id.len(), TRANS_ID_LEN);
        assert!(allocator.is_outstanding(&trans_id));
        // 在途的id不重复
        assert!(keys.insert(util::hex_key(&trans_id)));
    }

    assert_eq!(allocator.outstanding_count(), 100);
}

#[test]
pub fn test_release() {
    let allocator = TransactionAllocator::new();

    let trans_id = allocator.allocate();
    assert!(allocator.is_outstanding(&trans_id));

    assert!(allocator.release(&trans_id));
    assert!(!allocator.is_outstanding(&trans_id));
    assert_eq!(allocator.outstanding_count(), 0);

    // 重复释放
    assert!(!allocator.release(&trans_id));
}

#[test]
pub fn test_allocate_custom_len() {
    let allocator = TransactionAllocator::new();

    let trans_id = allocator.allocate_len(12).unwrap();
    assert_eq!(trans_id.len(), 12);
    assert!(allocator.is_outstanding(&trans_id));

    // 长度0不合法
    match allocator.allocate_len(0) {
        Err(StunError::InvalidArgument(_)) => {}
        v => panic!("expect InvalidArgument, got {:?}", v),
    }
}
