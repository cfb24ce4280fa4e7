//! Diesel schema for the repository registry.

diesel::table! {
    /// Registered target repositories.
    repositories (name) {
        /// Repository name in `owner/repo` form.
        #[max_length = 255]
        name -> Varchar,
        /// Filesystem path of the bare origin repository.
        path -> Text,
        /// Registration timestamp.
        created_at -> Timestamptz,
    }
}
