//! Diesel schema for gate run history.

diesel::table! {
    /// Append-only gate run records.
    gate_runs (id) {
        /// Monotonic run identifier.
        id -> Int8,
        /// Branch repository.
        #[max_length = 255]
        branch_repo -> Varchar,
        /// Branch name.
        #[max_length = 200]
        branch_name -> Varchar,
        /// Gate name.
        #[max_length = 100]
        gate_name -> Varchar,
        /// Revision under test.
        rev -> Text,
        /// Run status.
        #[max_length = 50]
        status -> Varchar,
        /// Start timestamp.
        started_at -> Timestamptz,
        /// Finish timestamp.
        finished_at -> Nullable<Timestamptz>,
        /// Exit code.
        exit_code -> Nullable<Int4>,
        /// Log file path.
        log_path -> Text,
    }
}
