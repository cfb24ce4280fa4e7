//! Diesel schema for task persistence.

diesel::table! {
    /// Task records keyed by repository and slug.
    tasks (repo, slug) {
        /// Repository name in `owner/repo` form.
        #[max_length = 255]
        repo -> Varchar,
        /// Repository-unique slug.
        #[max_length = 100]
        slug -> Varchar,
        /// Short title.
        title -> Text,
        /// Free-form description.
        body -> Text,
        /// Priority level 1..=5.
        priority -> Int2,
        /// Task status.
        #[max_length = 50]
        status -> Varchar,
        /// Ordered `owner/repo/slug` dependency references.
        depends_on -> Array<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
