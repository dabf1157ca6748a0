//! Configuration access port trait.

pub trait ConfigPort {
    fn get_str(&self, section: &str, key: &str) -> Option<String>;
    fn get_i64(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_f64(&self, section: &str, key: &str, default: f64) -> f64;
}
