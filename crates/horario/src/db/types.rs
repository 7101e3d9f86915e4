/// Keys of the values kept in the key/value store

/// The logical keys this application reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// `Vec<Course>` authored by the user
    ManualCourses,
    /// `CourseCache` snapshot of the last successful fetch
    StoredApiCourses,
    /// `Selection` of course identities
    SelectedCourses,
}

impl StoreKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::ManualCourses => "manualCourses",
            StoreKey::StoredApiCourses => "storedApiCourses",
            StoreKey::SelectedCourses => "selectedCourses",
        }
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
