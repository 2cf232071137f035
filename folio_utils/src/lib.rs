/// Returns the version string reported by the binaries and the user agent.
pub fn folio_version() -> &'static str {
    match option_env!("FOLIO_VERSION") {
        Some(version) => version,
        None => concat!(env!("CARGO_PKG_VERSION"), "-dev"),
    }
}

pub trait Apply {
    /// Applies the function `f` to `self` and returns the result.
    fn apply<T>(self, f: impl FnOnce(Self) -> T) -> T
    where
        Self: Sized,
    {
        f(self)
    }

    /// Applies the function `f` only if `value` is `Some(...)` and provides the
    /// contained value to `f`.
    ///
    /// #### Example
    /// ```rust
    /// # use folio_utils::Apply;
    /// fn with_suffix(name: String, suffix: Option<&str>) -> String {
    ///     name.apply_map(suffix, |name, suffix| format!("{name} {suffix}"))
    /// }
    /// assert_eq!(with_suffix("Jane".into(), None), "Jane");
    /// assert_eq!(with_suffix("Jane".into(), Some("Doe")), "Jane Doe");
    /// ```
    fn apply_map<U>(self, value: Option<U>, f: impl FnOnce(Self, U) -> Self) -> Self
    where
        Self: Sized,
    {
        if let Some(value) = value {
            f(self, value)
        } else {
            self
        }
    }
}

impl<T> Apply for T {}

#[macro_export]
macro_rules! assert_matches {
    ($expr:expr, $pat:pat) => {
        match ($expr) {
            $pat => (),
            val => ::core::panic!(
                "Assertion failed: Value {val:?} did not match pattern {}",
                ::core::stringify!($pat)
            ),
        }
    };
    ($expr:expr, $pat:pat if $pred:expr) => {{
        let val = $expr;
        match (&val) {
            $pat if $pred => (),
            #[allow(unused_variables)]
            $pat => ::core::panic!(
                "Assertion failed: Value {val:?} does not match predicate {}",
                ::core::stringify!($pred)
            ),
            _ => ::core::panic!(
                "Assertion failed: Value {val:?} did not match pattern {}",
                ::core::stringify!($pat)
            ),
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_passes_value() {
        assert_eq!(3_u32.apply(|x| x * 2), 6);
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!folio_version().is_empty());
    }

    #[test]
    fn assert_matches_with_predicate() {
        let value: Result<u32, ()> = Ok(7);
        assert_matches!(value, Ok(x) if *x > 5);
    }
}
