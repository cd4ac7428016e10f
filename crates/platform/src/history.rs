use url::Url;

/// Session history for a single tab. `push_state` truncates forward entries.
#[derive(Clone, Debug)]
pub struct History {
    entries: Vec<Url>,
    index: usize,
}

impl History {
    pub fn new(initial: Url) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
        }
    }

    pub fn current(&self) -> &Url {
        &self.entries[self.index]
    }

    pub fn push_state(&mut self, url: Url) {
        self.entries.truncate(self.index + 1);
        self.entries.push(url);
        self.index += 1;
    }

    pub fn replace_state(&mut self, url: Url) {
        self.entries[self.index] = url;
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Url] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn push_and_replace() {
        let mut h = History::new(url("https://site.test/index.html"));
        h.push_state(url("https://site.test/index.html?a=1"));
        assert_eq!(h.len(), 2);
        h.replace_state(url("https://site.test/index.html#order"));
        assert_eq!(h.current().as_str(), "https://site.test/index.html#order");
        assert_eq!(h.entries()[0].as_str(), "https://site.test/index.html");
    }
}
