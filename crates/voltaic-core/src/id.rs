use slotmap::new_key_type;

new_key_type! {
    /// Identifies a network (connected component) in the grid.
    pub struct NetworkId;

    /// Identifies a registered producer capability.
    pub struct ProducerId;

    /// Identifies a registered consumer capability.
    pub struct ConsumerId;

    /// Identifies a registered accumulator capability.
    pub struct AccumulatorId;
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn keys_are_ordered_by_insertion() {
        let mut sm = SlotMap::<ConsumerId, ()>::with_key();
        let a = sm.insert(());
        let b = sm.insert(());
        assert!(a < b);
        assert_ne!(a, b);
    }

    #[test]
    fn removed_key_is_not_reused() {
        let mut sm = SlotMap::<NetworkId, u8>::with_key();
        let a = sm.insert(1);
        sm.remove(a);
        let b = sm.insert(2);
        assert_ne!(a, b);
        assert!(!sm.contains_key(a));
    }
}
