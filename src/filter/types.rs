use serde::{Deserialize, Serialize};

/// Criteria narrowing a transaction query. Every field is optional; blank
/// strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub kind: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub payment_method: Option<String>,
    /// "yes" / "no"
    pub installment: Option<String>,
    /// "true" / "false"
    pub status: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl FilterSpec {
    /// Same criteria with pagination removed, for whole-set operations.
    pub fn without_pagination(&self) -> Self {
        Self {
            page: None,
            page_size: None,
            ..self.clone()
        }
    }
}

/// One page of an ordered result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Size of the full filtered set, before slicing
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"dateFrom":"01/01/2024","paymentMethod":"pix","pageSize":50}"#).unwrap();
        assert_eq!(spec.date_from.as_deref(), Some("01/01/2024"));
        assert_eq!(spec.payment_method.as_deref(), Some("pix"));
        assert_eq!(spec.page_size, Some(50));
        assert_eq!(spec.page, None);
        assert_eq!(spec.kind, None);
    }

    #[test]
    fn strips_pagination() {
        let spec = FilterSpec {
            kind: Some("entrada".into()),
            page: Some(3),
            page_size: Some(10),
            ..Default::default()
        };
        let whole = spec.without_pagination();
        assert_eq!(whole.kind, spec.kind);
        assert_eq!(whole.page, None);
        assert_eq!(whole.page_size, None);
    }
}
