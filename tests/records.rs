use letor_datapoint::{
    is_unknown, parse_line, parse_line_with, Dataset, FeatureStore, FeatureVector, ParseConfig,
    ParseError, Record, Storage, Strictness,
};
use proptest::prelude::*;

#[test]
fn documented_example_round_trips() {
    let line = "2 qid:3 1:0.5 3:0.8 # note";
    for storage in [Storage::Dense, Storage::Sparse] {
        let r = parse_line(line, storage).unwrap();
        assert_eq!(r.label(), 2.0);
        assert_eq!(r.id(), "3");
        assert_eq!(r.description(), "# note");
        assert_eq!(r.feature_count(), 3);
        assert!(is_unknown(r.get_feature(2)));
        assert_eq!(r.to_text(), line);

        let whole = r.read_whole_vector();
        assert_eq!(whole.len(), 4);
        assert!(is_unknown(whole[0]));
        assert_eq!(whole[3], 0.8);
    }
}

#[test]
fn documented_errors() {
    assert!(matches!(
        parse_line("-1 qid:1 1:0.5", Storage::Dense),
        Err(ParseError::NegativeLabel { .. })
    ));
    assert!(matches!(
        parse_line("2 qid:1 0:0.5", Storage::Sparse),
        Err(ParseError::InvalidFeatureIndex { index: 0 })
    ));
}

#[test]
fn growth_reports_unknown_in_new_range() {
    let mut r = parse_line("1 qid:1 4:1", Storage::Dense).unwrap();
    let before = r.feature_count();
    r.set_feature(200, 0.0).unwrap();
    assert_eq!(r.feature_count(), 200);
    for f in (before + 1)..200 {
        assert!(is_unknown(r.get_feature(f)), "feature {f}");
    }
    assert_eq!(r.get_feature(200), 0.0);
}

#[test]
fn missing_as_zero_does_not_leak_between_calls() {
    let zero = ParseConfig::new().with_missing_as_zero(true);
    let a = parse_line_with("1 qid:1 2:1", &zero).unwrap();
    let b = parse_line_with("1 qid:1 2:1", &ParseConfig::default()).unwrap();
    assert_eq!(a.get_feature(1), 0.0);
    assert!(is_unknown(b.get_feature(1)));
}

#[test]
fn dataset_from_reader() {
    let text = "1 qid:a 1:1\n0 qid:b 2:2\n2 qid:a 3:3 # c\n";
    let ds = Dataset::read_from(text.as_bytes(), &ParseConfig::default(), Strictness::Strict).unwrap();
    assert_eq!(ds.len(), 3);
    assert_eq!(ds.rank_list("a").unwrap().len(), 2);
    assert_eq!(ds.rank_list("b").unwrap().records[0].get_feature(2), 2.0);
}

fn arb_line() -> impl Strategy<Value = String> {
    (
        0u8..5,
        "[a-z0-9]{1,6}",
        proptest::collection::vec((1usize..300, -50.0f32..50.0), 0..25),
        proptest::option::of("[a-z ]{0,10}"),
    )
        .prop_map(|(label, id, feats, comment)| {
            let mut line = format!("{label} qid:{id}");
            for (f, v) in feats {
                line.push_str(&format!(" {f}:{v}"));
            }
            if let Some(c) = comment {
                line.push_str(&format!(" #{c}"));
            }
            line
        })
}

proptest! {
    /// parse -> to_text -> parse keeps every explicitly set feature
    #[test]
    fn text_round_trip_keeps_known_features(line in arb_line(), sparse in any::<bool>()) {
        let storage = if sparse { Storage::Sparse } else { Storage::Dense };
        let first = parse_line(&line, storage).unwrap();
        let second = parse_line(&first.to_text(), storage).unwrap();
        prop_assert_eq!(first.id(), second.id());
        prop_assert_eq!(first.label(), second.label());
        prop_assert_eq!(first.description(), second.description());
        prop_assert_eq!(first.vector().known_pairs(), second.vector().known_pairs());
        for f in 1..=first.feature_count() + 2 {
            let (a, b) = (first.get_feature(f), second.get_feature(f));
            prop_assert!((is_unknown(a) && is_unknown(b)) || a == b, "feature {}", f);
        }
    }

    /// the same line yields the same whole vector in both storages
    #[test]
    fn storages_agree_on_parsed_lines(line in arb_line()) {
        let d = parse_line(&line, Storage::Dense).unwrap();
        let s = parse_line(&line, Storage::Sparse).unwrap();
        let (dv, sv) = (d.read_whole_vector(), s.read_whole_vector());
        prop_assert_eq!(dv.len(), sv.len());
        for (a, b) in dv.iter().zip(&sv) {
            prop_assert!((is_unknown(*a) && is_unknown(*b)) || a == b);
        }
    }
}

#[test]
fn programmatic_records_share_the_contract() {
    let values = vec![f32::NAN, f32::NAN, 3.0, f32::NAN, 0.0];
    let d = Record::new(1.0, "q", values.clone(), Storage::Dense).unwrap();
    let s = Record::new(1.0, "q", values, Storage::Sparse).unwrap();
    assert_eq!(d.to_text(), s.to_text());
    assert_eq!(d.to_text(), "1 qid:q 2:3 4:0");

    let mut store: FeatureStore = FeatureStore::new(Storage::Sparse);
    store.replace_whole_vector(&d.read_whole_vector()).unwrap();
    assert_eq!(store.known_pairs(), vec![(2, 3.0), (4, 0.0)]);
}
