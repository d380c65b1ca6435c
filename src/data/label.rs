/// Outcome of coercing one `humor` cell to a 0/1 label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelParse {
    /// Strict boolean literal (`true` / `false`).
    Bool(bool),
    /// Matched the fallback table (`True`, `False`, ...).
    Mapped(u8),
    /// Null or unrecognized; the row keeps an unset label.
    Unset,
}

impl LabelParse {
    /// Try the strict parse first, then the closed-set lookup.
    pub fn from_cell(cell: Option<&str>) -> Self {
        let Some(raw) = cell else {
            return LabelParse::Unset;
        };
        if let Ok(b) = raw.parse::<bool>() {
            return LabelParse::Bool(b);
        }
        match raw {
            "True" | "true" => LabelParse::Mapped(1),
            "False" | "false" => LabelParse::Mapped(0),
            _ => LabelParse::Unset,
        }
    }

    pub fn label(self) -> Option<u8> {
        match self {
            LabelParse::Bool(b) => Some(u8::from(b)),
            LabelParse::Mapped(v) => Some(v),
            LabelParse::Unset => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn true_like_values_map_to_one() {
        for v in ["true", "True"] {
            assert_eq!(LabelParse::from_cell(Some(v)).label(), Some(1), "{v}");
        }
    }

    #[test]
    fn false_like_values_map_to_zero() {
        for v in ["false", "False"] {
            assert_eq!(LabelParse::from_cell(Some(v)).label(), Some(0), "{v}");
        }
    }

    #[test]
    fn strict_parse_wins_over_table() {
        assert_eq!(LabelParse::from_cell(Some("true")), LabelParse::Bool(true));
        assert_eq!(LabelParse::from_cell(Some("False")), LabelParse::Mapped(0));
    }

    #[test]
    fn unknown_and_null_stay_unset() {
        assert_eq!(LabelParse::from_cell(None), LabelParse::Unset);
        for v in ["TRUE", "FALSE", "yes", "1", " true", ""] {
            assert_eq!(LabelParse::from_cell(Some(v)).label(), None, "{v:?}");
        }
    }
}
