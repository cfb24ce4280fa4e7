//! Diesel schema for agent session persistence.

diesel::table! {
    /// Agent sessions keyed by UUID.
    agent_sessions (id) {
        /// Session identifier.
        id -> Uuid,
        /// Branch repository.
        #[max_length = 255]
        branch_repo -> Varchar,
        /// Branch name.
        #[max_length = 200]
        branch_name -> Varchar,
        /// Agent kind.
        #[max_length = 100]
        agent_type -> Varchar,
        /// Prompt.
        prompt -> Text,
        /// OS process id.
        pid -> Nullable<Int8>,
        /// Session status.
        #[max_length = 50]
        status -> Varchar,
        /// Exit code.
        exit_code -> Nullable<Int4>,
        /// Creation timestamp.
        started_at -> Timestamptz,
        /// Terminal timestamp.
        ended_at -> Nullable<Timestamptz>,
    }
}
