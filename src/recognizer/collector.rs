use super::{RecognizerCollector, RecognizerFn};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

impl RecognizerCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recognizer callable under a terminal name. A later
    /// registration under the same name replaces the earlier one.
    pub fn register<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: for<'i> Fn(&'i str, usize) -> Option<&'i str> + 'static,
    {
        self.all.insert(name.into(), Rc::new(func));
    }

    pub fn get(&self, name: &str) -> Option<&RecognizerFn> {
        self.all.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.all.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// All registered entries.
    pub fn all(&self) -> impl Iterator<Item = (&str, &RecognizerFn)> {
        self.all.iter().map(|(name, func)| (name.as_str(), func))
    }
}

impl Debug for RecognizerCollector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.all.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("RecognizerCollector")
            .field("names", &names)
            .finish()
    }
}
