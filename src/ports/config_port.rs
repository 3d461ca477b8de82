//! Configuration access port.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// Non-empty trimmed string value.
    fn get_nonempty(&self, section: &str, key: &str) -> Option<String> {
        self.get_string(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
