//! Tests for joining related time-use extracts

use survey_traits::schema::{column_names, detect_shared_key, merge_extracts};
use survey_traits::utils::arrow::numeric_values;
use survey_traits::utils::test::time_use_batches;

#[test]
fn test_merge_time_use_extracts() {
    let (respondents, summary) = time_use_batches(50, 3);
    let key = detect_shared_key(&column_names(&respondents), &column_names(&summary)).unwrap();
    assert_eq!(key, "TUCASEID");

    let merged = merge_extracts(&respondents, &summary, "_sum").unwrap();
    assert_eq!(merged.num_rows(), 50);
    assert_eq!(
        column_names(&merged),
        vec!["TUCASEID", "TESEX", "TEAGE", "GEREG", "TUFINLWGT", "TESEX_sum", "t030101", "t030102"]
    );

    // joined rows line up despite the reversed summary order
    let sex = numeric_values(&merged, "TESEX").unwrap();
    let sex_sum = numeric_values(&merged, "TESEX_sum").unwrap();
    assert_eq!(sex, sex_sum);
    let ids = numeric_values(&merged, "TUCASEID").unwrap();
    assert_eq!(ids, numeric_values(&respondents, "TUCASEID").unwrap());
}
