use std::ops::Deref;

/// Positional arguments bound to the selected command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Args(Vec<String>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// First positional, or `None` when there are no positionals.
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub(crate) fn push(&mut self, arg: impl Into<String>) {
        self.0.push(arg.into());
    }
}

impl Deref for Args {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<String>> for Args {
    fn from(v: Vec<String>) -> Self {
        Self(v)
    }
}

impl<S: Into<String>> FromIterator<S> for Args {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a Args {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<const N: usize> PartialEq<[&str; N]> for Args {
    fn eq(&self, other: &[&str; N]) -> bool {
        self.0.len() == N && self.0.iter().zip(other).all(|(a, b)| a == b)
    }
}

impl PartialEq<[&str]> for Args {
    fn eq(&self, other: &[&str]) -> bool {
        self.0.len() == other.len() && self.0.iter().zip(other).all(|(a, b)| a == b)
    }
}

impl PartialEq<Vec<&str>> for Args {
    fn eq(&self, other: &Vec<&str>) -> bool {
        self == other.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::Args;

    #[test]
    fn compares_by_sequence() {
        let args: Args = ["first", "second", "-"].into_iter().collect();
        assert_eq!(args, ["first", "second", "-"]);
        assert_eq!(args, vec!["first", "second", "-"]);
        assert_ne!(args, ["first", "-", "second"]);
        assert_eq!(args.first(), Some("first"));
        assert_eq!(args.get(2), Some("-"));
        assert_eq!(args.get(3), None);
        assert_eq!(args.len(), 3);
        assert_eq!(Args::new().first(), None);
    }
}
