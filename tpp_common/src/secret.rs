use std::{
    fmt,
    fmt::{Debug, Display},
};

/// A wrapper that keeps shared secrets (webhook signing keys, broker credentials) out of logs.
#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl Secret<String> {
    /// True when no secret has been configured at all.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn secrets_are_never_printed() {
        let secret = Secret::new("super-secret-signing-key".to_string());
        assert_eq!(format!("{secret}"), "****");
        assert_eq!(format!("{secret:?}"), "****");
        assert_eq!(secret.reveal(), "super-secret-signing-key");
        assert!(!secret.is_empty());
        assert!(Secret::<String>::default().is_empty());
    }
}
