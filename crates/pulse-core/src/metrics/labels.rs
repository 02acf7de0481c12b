use crate::error::{PulseError, Result};
use crate::metrics::desc::Desc;

/// Order caller-supplied `(key, value)` pairs by the declared label names.
///
/// The keys must be exactly the declared names, each once, in any order.
pub(crate) fn resolve(desc: &Desc, labels: &[(&str, &str)]) -> Result<Vec<String>> {
    let declared = desc.label_names();
    if labels.len() != declared.len() {
        return Err(mismatch(desc, labels));
    }

    let mut values = Vec::with_capacity(declared.len());
    for name in declared {
        let mut found = labels.iter().filter(|(k, _)| *k == name.as_str());
        match (found.next(), found.next()) {
            (Some((_, v)), None) => values.push((*v).to_string()),
            _ => return Err(mismatch(desc, labels)),
        }
    }
    Ok(values)
}

fn mismatch(desc: &Desc, labels: &[(&str, &str)]) -> PulseError {
    PulseError::LabelMismatch {
        name: desc.name().to_string(),
        expected: desc.label_names().join(","),
        got: labels.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(","),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn desc() -> Desc {
        Desc::new("m", "h", &["method", "route"]).unwrap()
    }

    #[test]
    fn orders_by_declaration() {
        let v = resolve(&desc(), &[("route", "/"), ("method", "GET")]).unwrap();
        assert_eq!(v, ["GET", "/"]);
    }

    #[test]
    fn rejects_missing_extra_and_repeated_keys() {
        let d = desc();
        for labels in [
            vec![("method", "GET")],
            vec![("method", "GET"), ("route", "/"), ("code", "200")],
            vec![("method", "GET"), ("method", "POST")],
            vec![("method", "GET"), ("path", "/")],
        ] {
            let err = resolve(&d, &labels).unwrap_err();
            assert_eq!(err.code(), ErrorCode::LabelMismatch);
        }
    }

    #[test]
    fn empty_for_label_free() {
        let d = Desc::new("m", "h", &[]).unwrap();
        assert!(resolve(&d, &[]).unwrap().is_empty());
        assert!(resolve(&d, &[("a", "b")]).is_err());
    }
}
