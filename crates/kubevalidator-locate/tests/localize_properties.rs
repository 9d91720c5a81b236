//! Property tests: localization is total and well-formed for arbitrary
//! inputs, and exact for generated flat documents.

use kubevalidator_core::{LineRange, LogicalPath};
use kubevalidator_locate::{LineLocalizer, RemoveNode};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,6}"
}

proptest! {
    #[test]
    fn never_panics_and_range_is_ordered(
        source in "[ -~\n]{0,200}",
        document in 0usize..3,
        path in prop::collection::vec(segment(), 0..4),
    ) {
        let path = LogicalPath::new(path);
        for localizer in [LineLocalizer::default(), LineLocalizer::new(Box::new(RemoveNode))] {
            let range = localizer.locate(&source, document, &path);
            prop_assert!(range.start() >= 1);
            prop_assert!(range.start() <= range.end());
        }
    }

    #[test]
    fn flat_mapping_keys_are_found_on_their_line(
        keys in prop::collection::btree_set("[a-z]{3,8}", 1..8),
        pick in any::<prop::sample::Index>(),
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let source: String = keys
            .iter()
            .enumerate()
            .map(|(i, k)| format!("{k}: value{i}\n"))
            .collect();
        let target = pick.index(keys.len());
        let path = LogicalPath::new([keys[target].clone()]);

        let range = LineLocalizer::default().locate(&source, 0, &path);
        prop_assert_eq!(range, LineRange::line(target + 1));
    }
}
