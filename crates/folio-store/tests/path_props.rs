use folio_store::{CollectionPath, DocPath, PathError};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,12}"
}

proptest! {
    #[test]
    fn prop_alternating_segments_roundtrip(segments in prop::collection::vec(segment(), 1..8)) {
        let raw = segments.join("/");
        if segments.len() % 2 == 0 {
            let path: DocPath = raw.parse().unwrap();
            prop_assert_eq!(path.to_string(), raw.clone());
            prop_assert_eq!(path.id(), segments.last().unwrap().as_str());
            prop_assert!(path.parent().contains(&path));
            prop_assert!(raw.parse::<CollectionPath>().is_err());
        } else {
            let path: CollectionPath = raw.parse().unwrap();
            prop_assert_eq!(path.to_string(), raw.clone());
            prop_assert_eq!(path.segments().len(), segments.len());
            prop_assert!(raw.parse::<DocPath>().is_err());
        }
    }

    #[test]
    fn prop_child_paths_stay_within_parent(
        collection in segment(),
        doc in segment(),
        sub in segment(),
    ) {
        let root = CollectionPath::root(collection).unwrap();
        let parent = root.doc(doc).unwrap();
        let nested = parent.collection(sub).unwrap();
        prop_assert_eq!(nested.parent(), Some(parent.clone()));
        prop_assert!(root.contains(&parent));
    }
}

#[test]
fn empty_path_is_rejected() {
    assert!(matches!("".parse::<DocPath>(), Err(PathError::EmptySegment)));
}
