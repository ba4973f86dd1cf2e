//! Case-insensitive multi-valued string map used for headers and cookies.

/// A string multimap whose keys compare ASCII case-insensitively.
///
/// Duplicate keys are kept. Iteration order is unspecified; callers must not
/// depend on it beyond "every entry is visited once".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, keeping any existing values for the same key.
    pub fn add<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.entries.push((key.into(), value.into()));
    }

    /// Replaces every value stored for `key` with exactly one `value`.
    pub fn change<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let key = key.into();
        self.delete(&key);
        self.entries.push((key, value.into()));
    }

    /// Removes every value stored for `key`.
    pub fn delete(&mut self, key: &str) {
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
    }

    /// Returns the first value stored for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).next()
    }

    pub fn get_all<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a str> {
        self.entries.iter().filter(move |(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K, V> FromIterator<(K, V)> for FieldMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let mut map = FieldMap::new();
        map.add("Content-Type", "text/plain");

        assert_eq!(map.get("content-type"), Some("text/plain"));
        assert_eq!(map.get("CONTENT-TYPE"), Some("text/plain"));
        assert!(map.has("Content-type"));
        assert!(!map.has("Content-Length"));
        assert_eq!(map.get("Content-Length"), None);
    }

    #[test]
    fn add_keeps_duplicates() {
        let mut map = FieldMap::new();
        map.add("Accept", "text/html");
        map.add("accept", "application/json");

        assert_eq!(map.len(), 2);
        let values: Vec<_> = map.get_all("ACCEPT").collect();
        assert_eq!(values, ["text/html", "application/json"]);
    }

    #[test]
    fn change_leaves_exactly_one_value() {
        let mut map: FieldMap = [("Via", "a"), ("Host", "h"), ("via", "b")].into_iter().collect();

        map.change("VIA", "c");

        assert_eq!(map.get_all("via").collect::<Vec<_>>(), ["c"]);
        assert_eq!(map.get("host"), Some("h"));
        assert_eq!(map.len(), 2);

        map.change("X-New", "1");
        assert_eq!(map.get("x-new"), Some("1"));
    }

    #[test]
    fn delete_removes_all_values() {
        let mut map: FieldMap = [("Via", "a"), ("Host", "h"), ("VIA", "b")].into_iter().collect();

        map.delete("via");

        assert!(!map.has("Via"));
        assert_eq!(map.len(), 1);

        map.clear();
        assert!(map.is_empty());
    }
}
