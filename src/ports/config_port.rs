//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// Comma-separated list of non-negative integers.
    ///
    /// Returns `None` when the key is absent, `Some(Err(item))` with the first
    /// entry that does not parse.
    fn get_usize_list(&self, section: &str, key: &str) -> Option<Result<Vec<usize>, String>> {
        let raw = self.get_string(section, key)?;
        Some(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<usize>().map_err(|_| s.to_string()))
                .collect(),
        )
    }
}
