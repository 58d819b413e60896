//! Reusable attribute validators.

use super::Validator;
use crate::tree::Value;

/// Accepts string values from a fixed list.
///
/// With `case_insensitive` the comparison ignores ASCII case. Non-string
/// values are compared by their display form.
pub fn one_of<I, S>(options: I, case_insensitive: bool) -> Validator<Value>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let options: Vec<String> = options.into_iter().map(Into::into).collect();
    Validator::predicate(move |value: &Value| {
        let rendered = value.to_string();
        options.iter().any(|option| {
            if case_insensitive {
                option.eq_ignore_ascii_case(&rendered)
            } else {
                *option == rendered
            }
        })
    })
}

/// Accepts numeric values within the inclusive bounds.
///
/// A non-numeric value is rejected with a diagnostic.
pub fn range(min: Option<f64>, max: Option<f64>) -> Validator<Value> {
    Validator::new(move |value: &Value| {
        let Some(n) = value.as_f64() else {
            return Err(format!("{value} is not a number"));
        };
        if let Some(min) = min
            && n < min
        {
            return Err(format!("must be at least {min}"));
        }
        if let Some(max) = max
            && n > max
        {
            return Err(format!("must be at most {max}"));
        }
        Ok(true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_of_respects_case_flag() {
        let levels = one_of(["INFO", "WARNING", "ERROR", "CRITICAL"], true);
        assert!(levels.check(&Value::from("warning")).is_ok());
        assert!(levels.check(&Value::from("debug")).is_err());

        let strict = one_of(["INFO"], false);
        assert!(strict.check(&Value::from("info")).is_err());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let port = range(Some(1.0), Some(65535.0));
        assert!(port.check(&Value::Int(1)).is_ok());
        assert!(port.check(&Value::Int(65535)).is_ok());
        assert_eq!(
            port.check(&Value::Int(0)),
            Err(Some("must be at least 1".to_string()))
        );
        assert!(port.check(&Value::from("x")).is_err());
    }
}
