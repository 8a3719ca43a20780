/// Main test module that includes all sub-modules
/// Run specific tests with `cargo test <module>::<submodule>`
/// For example: `cargo test pipeline::survey_test`

// Algorithm tests
pub mod algorithm {
    pub mod labels_test;
    pub mod logit_test;
    pub mod validation_test;
}

// Schema resolution and extract merging
pub mod schema {
    pub mod merge_test;
}

// End-to-end pipeline tests
pub mod pipeline {
    pub mod run_test;
    pub mod survey_test;
}
