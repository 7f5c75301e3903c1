//! Webhook payload fields and their two text renderings: a compact single
//! line for the alert message and a pretty block for the on-page preview.

/// Substituted by the charting platform with the chart symbol at fire time.
/// Also stands in for the symbol field when no ticker was supplied.
pub const SYMBOL_TOKEN: &str = "{{ticker}}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Rendered as a quoted, escaped JSON string.
    Text(String),
    /// Platform token for a numeric field. Rendered bare so the realized
    /// message parses with an unquoted number in its place.
    NumberToken(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadField {
    pub key: &'static str,
    pub value: FieldValue,
}

/// The one field set both outputs share, in order: symbol, setup, price,
/// volume, timestamp.
pub fn fields(setup: &str, symbol: String) -> Vec<PayloadField> {
    vec![
        PayloadField {
            key: "symbol",
            value: FieldValue::Text(symbol),
        },
        PayloadField {
            key: "setup",
            value: FieldValue::Text(setup.to_string()),
        },
        PayloadField {
            key: "price",
            value: FieldValue::NumberToken("{{close}}"),
        },
        PayloadField {
            key: "volume",
            value: FieldValue::NumberToken("{{volume}}"),
        },
        PayloadField {
            key: "timestamp",
            value: FieldValue::Text("{{time}}".to_string()),
        },
    ]
}

pub fn render_compact(fields: &[PayloadField]) -> String {
    let mut out = String::from("{");
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&quote(field.key));
        out.push(':');
        push_value(&mut out, &field.value);
    }
    out.push('}');
    out
}

pub fn render_pretty(fields: &[PayloadField]) -> String {
    let mut out = String::from("{\n");
    for (i, field) in fields.iter().enumerate() {
        out.push_str("  ");
        out.push_str(&quote(field.key));
        out.push_str(": ");
        push_value(&mut out, &field.value);
        if i + 1 < fields.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push('}');
    out
}

fn push_value(out: &mut String, value: &FieldValue) {
    match value {
        FieldValue::Text(s) => out.push_str(&quote(s)),
        FieldValue::NumberToken(token) => out.push_str(token),
    }
}

fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_keeps_number_tokens_unquoted() {
        let rendered = render_compact(&fields("breakout", "AAPL".to_string()));
        assert_eq!(
            rendered,
            r#"{"symbol":"AAPL","setup":"breakout","price":{{close}},"volume":{{volume}},"timestamp":"{{time}}"}"#
        );
    }

    #[test]
    fn pretty_matches_two_space_indent() {
        let rendered = render_pretty(&fields("ma10", SYMBOL_TOKEN.to_string()));
        let expected = "{\n  \"symbol\": \"{{ticker}}\",\n  \"setup\": \"ma10\",\n  \"price\": {{close}},\n  \"volume\": {{volume}},\n  \"timestamp\": \"{{time}}\"\n}";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn text_values_are_json_escaped() {
        let rendered = render_compact(&[PayloadField {
            key: "symbol",
            value: FieldValue::Text("A\"B\\C".to_string()),
        }]);
        assert_eq!(rendered, r#"{"symbol":"A\"B\\C"}"#);
    }

    #[test]
    fn both_renderings_share_field_order() {
        let fields = fields("orh", "SPY".to_string());
        let keys: Vec<_> = fields.iter().map(|f| f.key).collect();
        assert_eq!(keys, ["symbol", "setup", "price", "volume", "timestamp"]);
    }
}
