use ocmtf_provider::import::parse_id;
use ocmtf_provider::ProviderError;

#[test]
fn splits_positional_parts() {
    let [cluster, pool] = parse_id::<2>("123,pool1", "Machine pool", "<a>,<b>").unwrap();
    assert_eq!((cluster, pool), ("123", "pool1"));
}

#[test]
fn trims_whitespace_around_parts() {
    let [cluster, pool] = parse_id::<2>(" 123 , pool1 ", "Machine pool", "<a>,<b>").unwrap();
    assert_eq!((cluster, pool), ("123", "pool1"));
}

#[test]
fn rejects_wrong_arity_and_blank_parts() {
    for id in ["123", "123,pool1,extra", "123,", ",pool1", ""] {
        let err = parse_id::<2>(id, "Machine pool", "<cluster_id>,<machine_pool_id>")
            .unwrap_err();
        match err {
            ProviderError::Invalid { summary, detail } => {
                assert_eq!(summary, "Invalid import identifier");
                assert_eq!(
                    detail,
                    "Machine pool to import should be specified as <cluster_id>,<machine_pool_id>"
                );
            }
            other => panic!("unexpected error for {id:?}: {other}"),
        }
    }
}
