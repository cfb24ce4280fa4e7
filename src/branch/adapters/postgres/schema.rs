//! Diesel schema for branch persistence.

diesel::table! {
    /// Branch records keyed by repository and branch name.
    branches (repo, name) {
        /// Repository name in `owner/repo` form.
        #[max_length = 255]
        repo -> Varchar,
        /// Git branch name.
        #[max_length = 200]
        name -> Varchar,
        /// `master` tip at creation.
        base_rev -> Nullable<Text>,
        /// Last recorded HEAD.
        head_rev -> Nullable<Text>,
        /// Checkout backend.
        #[max_length = 50]
        env_backend -> Varchar,
        /// Checkout directory.
        env_path -> Text,
        /// Branch status.
        #[max_length = 50]
        status -> Varchar,
        /// Linked task repository.
        #[max_length = 255]
        task_repo -> Nullable<Varchar>,
        /// Linked task slug.
        #[max_length = 100]
        task_slug -> Nullable<Varchar>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Merge timestamp.
        merged_at -> Nullable<Timestamptz>,
    }
}
