use ippan_rights_registry::{ErrorKind, Identity, RequestContext, RightsRegistry};
use proptest::prelude::*;

const ADMIN: Identity = Identity([0xAA; 32]);

fn arbitrary_identity() -> impl Strategy<Value = Identity> {
    prop::array::uniform32(any::<u8>()).prop_map(Identity::new)
}

fn invalid_metadata() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[a-z]{257,400}"]
}

proptest! {
    #[test]
    fn out_of_range_metadata_is_rejected(data in invalid_metadata()) {
        let registry = RightsRegistry::in_memory(ADMIN);
        let admin = RequestContext::new(ADMIN);

        let err = registry.register(&admin, data.clone()).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InvalidRoyaltyData);
        prop_assert_eq!(registry.last_issued_id(), 0);

        let id = registry.register(&admin, "valid").unwrap();
        let err = registry.update_metadata(&admin, id, data).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InvalidRoyaltyData);
        prop_assert_eq!(registry.get_metadata(id), Some("valid".to_string()));
    }

    #[test]
    fn in_range_metadata_round_trips(data in "\\PC{1,256}") {
        let registry = RightsRegistry::in_memory(ADMIN);
        let id = registry.register(&RequestContext::new(ADMIN), data.clone()).unwrap();
        prop_assert_eq!(registry.get_metadata(id), Some(data));
    }

    #[test]
    fn ids_increase_by_one_regardless_of_rejected_callers(
        callers in prop::collection::vec(prop_oneof![Just(ADMIN), arbitrary_identity()], 1..40),
    ) {
        let registry = RightsRegistry::in_memory(ADMIN);
        let mut expected = 0u64;

        for caller in callers {
            let result = registry.register(&RequestContext::new(caller), "item");
            if caller == ADMIN {
                expected += 1;
                prop_assert_eq!(result.unwrap(), expected);
            } else {
                prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::OwnerOnly);
            }
            prop_assert_eq!(registry.last_issued_id(), expected);
        }
    }

    #[test]
    fn transfer_chain_leaves_single_owner(
        chain in prop::collection::vec(arbitrary_identity(), 1..10),
    ) {
        let registry = RightsRegistry::in_memory(ADMIN);
        let id = registry.register(&RequestContext::new(ADMIN), "alpha").unwrap();

        let mut current = ADMIN;
        for next in chain {
            registry.transfer(&RequestContext::new(current), id, next).unwrap();
            current = next;
        }

        prop_assert_eq!(registry.get_owner(id), Some(current));
        prop_assert_eq!(registry.rights_of(&current), vec![id]);
    }
}
